// script.rs - Recorded input replay for the headless driver

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error_handling::Result;
use crate::interaction::InputEvent;

/// Window-level actions that are not pointer input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowAction {
    Resize { width: u32, height: u32 },
    /// Browser back button while a page is showing
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptAction {
    Input(InputEvent),
    Window(WindowAction),
}

/// One action applied before the given frame is animated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub frame: u64,
    pub action: ScriptAction,
}

/// Steps ordered by frame; same-frame steps keep file order
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
    cursor: usize,
}

impl InputScript {
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by_key(|s| s.frame);
        Self { steps, cursor: 0 }
    }

    /// Load a JSON array of steps
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(json: &str) -> Result<Self> {
        let steps: Vec<ScriptStep> = serde_json::from_str(json)?;
        debug!("Parsed input script with {} steps", steps.len());
        Ok(Self::new(steps))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Frame of the last step, if any
    pub fn last_frame(&self) -> Option<u64> {
        self.steps.last().map(|s| s.frame)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Actions due at or before `frame` that have not been returned yet
    pub fn due(&mut self, frame: u64) -> impl Iterator<Item = ScriptAction> + '_ {
        let start = self.cursor;
        while self.cursor < self.steps.len() && self.steps[self.cursor].frame <= frame {
            self.cursor += 1;
        }
        self.steps[start..self.cursor].iter().map(|s| s.action)
    }
}
