// stage.rs - Page-level collaborators around the 3D canvas
// A browser front end maps these onto DOM elements; the headless stage records them.

use glam::Vec2;
use serde::Serialize;
use std::collections::BTreeMap;

/// Elements outside the canvas that the scene drives
pub trait Stage {
    /// Custom cursor element follows the pointer
    fn move_cursor(&mut self, position: Vec2);

    /// Full-page fade overlay; when `blocks_pointer` it swallows input
    fn set_overlay(&mut self, opacity: f32, blocks_pointer: bool);

    /// Container holding the 3D canvas
    fn set_canvas_visible(&mut self, visible: bool);

    /// Flat content page by id; unknown ids are ignored
    fn set_page_visible(&mut self, page_id: &str, visible: bool);

    fn page_ids(&self) -> Vec<String>;

    fn has_page(&self, page_id: &str) -> bool {
        self.page_ids().iter().any(|id| id == page_id)
    }

    fn hide_all_pages(&mut self) {
        for id in self.page_ids() {
            self.set_page_visible(&id, false);
        }
    }
}

/// In-memory stage for the simulator and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessStage {
    pub cursor: Vec2,
    pub overlay_opacity: f32,
    pub overlay_blocks_pointer: bool,
    pub canvas_visible: bool,
    pub pages: BTreeMap<String, bool>,
}

impl HeadlessStage {
    pub fn new<I, S>(page_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cursor: Vec2::ZERO,
            overlay_opacity: 0.0,
            overlay_blocks_pointer: false,
            canvas_visible: true,
            pages: page_ids.into_iter().map(|id| (id.into(), false)).collect(),
        }
    }

    /// Id of the single visible page, if any
    pub fn visible_page(&self) -> Option<&str> {
        let mut visible = self.pages.iter().filter(|(_, v)| **v).map(|(id, _)| id.as_str());
        match (visible.next(), visible.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }
}

impl Stage for HeadlessStage {
    fn move_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    fn set_overlay(&mut self, opacity: f32, blocks_pointer: bool) {
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
        self.overlay_blocks_pointer = blocks_pointer;
    }

    fn set_canvas_visible(&mut self, visible: bool) {
        self.canvas_visible = visible;
    }

    fn set_page_visible(&mut self, page_id: &str, visible: bool) {
        if let Some(state) = self.pages.get_mut(page_id) {
            *state = visible;
        }
    }

    fn page_ids(&self) -> Vec<String> {
        self.pages.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_start_hidden_and_canvas_visible() {
        let stage = HeadlessStage::new(["page1", "page2"]);
        assert!(stage.canvas_visible);
        assert_eq!(stage.visible_page(), None);
        assert!(stage.has_page("page2"));
        assert!(!stage.has_page("page3"));
    }

    #[test]
    fn test_unknown_page_is_ignored() {
        let mut stage = HeadlessStage::new(["page1"]);
        stage.set_page_visible("nope", true);
        assert_eq!(stage.pages.len(), 1);
        assert_eq!(stage.visible_page(), None);
    }

    #[test]
    fn test_hide_all_pages() {
        let mut stage = HeadlessStage::new(["a", "b"]);
        stage.set_page_visible("a", true);
        stage.set_page_visible("b", true);
        assert_eq!(stage.visible_page(), None);
        stage.hide_all_pages();
        assert!(stage.pages.values().all(|v| !v));
    }
}
