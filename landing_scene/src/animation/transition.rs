// animation/transition.rs - Fade overlay state machine swapping the canvas and content pages

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::oneshot;

use super::{AnimationError, Easing, Result, Tween};
use crate::config::TransitionConfig;
use crate::stage::Stage;

/// What becomes visible once the overlay is opaque
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PageTarget {
    Page(String),
    Canvas,
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTarget::Page(id) => write!(f, "page '{id}'"),
            PageTarget::Canvas => write!(f, "canvas"),
        }
    }
}

/// Coarse phase, for snapshots and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Idle,
    FadingIn,
    FadingOut,
}

enum Phase {
    Idle,
    FadingIn {
        target: PageTarget,
        overlay: Tween<f32>,
        done: oneshot::Sender<()>,
    },
    FadingOut {
        target: PageTarget,
        overlay: Tween<f32>,
        done: oneshot::Sender<()>,
    },
}

/// Fade in, swap, fade out. Only one sequence runs at a time.
pub struct PageTransition {
    fade: Duration,
    easing: Easing,
    phase: Phase,
    showing: PageTarget,
}

impl PageTransition {
    pub fn new(config: &TransitionConfig) -> Self {
        Self {
            fade: Duration::from_millis(config.fade_duration_ms),
            easing: config.easing,
            phase: Phase::Idle,
            showing: PageTarget::Canvas,
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        match self.phase {
            Phase::Idle => TransitionPhase::Idle,
            Phase::FadingIn { .. } => TransitionPhase::FadingIn,
            Phase::FadingOut { .. } => TransitionPhase::FadingOut,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Target of the last completed swap
    pub fn showing(&self) -> &PageTarget {
        &self.showing
    }

    /// Start a transition. The receiver resolves when the overlay has faded
    /// back out and the machine is idle again.
    pub fn begin(&mut self, target: PageTarget, stage: &dyn Stage) -> Result<oneshot::Receiver<()>> {
        if let Phase::FadingIn { target: active, .. } | Phase::FadingOut { target: active, .. } =
            &self.phase
        {
            return Err(AnimationError::TransitionInFlight {
                active: active.to_string(),
            });
        }

        if let PageTarget::Page(id) = &target {
            if !stage.has_page(id) {
                return Err(AnimationError::UnknownPage(id.clone()));
            }
        }

        info!("Transition to {} started", target);
        let (tx, rx) = oneshot::channel();
        self.phase = Phase::FadingIn {
            target,
            overlay: Tween::new(0.0, 1.0, self.fade).with_easing(self.easing),
            done: tx,
        };
        Ok(rx)
    }

    /// Advance by one frame's elapsed time
    pub fn update(&mut self, dt: Duration, stage: &mut dyn Stage) {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => Phase::Idle,

            Phase::FadingIn { target, mut overlay, done } => {
                let running = overlay.update(dt);
                stage.set_overlay(*overlay.current(), true);
                if running {
                    Phase::FadingIn { target, overlay, done }
                } else {
                    swap(&target, stage);
                    self.showing = target.clone();
                    debug!("Overlay opaque, swapped to {}", target);
                    Phase::FadingOut {
                        target,
                        overlay: Tween::new(1.0, 0.0, self.fade).with_easing(self.easing),
                        done,
                    }
                }
            }

            Phase::FadingOut { target, mut overlay, done } => {
                let running = overlay.update(dt);
                stage.set_overlay(*overlay.current(), running);
                if running {
                    Phase::FadingOut { target, overlay, done }
                } else {
                    info!("Transition to {} finished", target);
                    // Receiver may have been dropped; completion is still reached
                    let _ = done.send(());
                    Phase::Idle
                }
            }
        };
    }
}

fn swap(target: &PageTarget, stage: &mut dyn Stage) {
    match target {
        PageTarget::Page(id) => {
            stage.set_canvas_visible(false);
            stage.hide_all_pages();
            stage.set_page_visible(id, true);
        }
        PageTarget::Canvas => {
            stage.hide_all_pages();
            stage.set_canvas_visible(true);
        }
    }
}
