// interaction.rs - Pointer/touch handling: drag-to-rotate, hover picking, dwell-to-click

use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::animation::{AnimationError, Result};
use crate::config::InteractionConfig;
use crate::scene::{Layout, MatrixId, Ray, SceneBundle};
use crate::stage::Stage;

// ============================================================================
// INPUT EVENTS
// ============================================================================

/// Browser input, reduced to what the scene reacts to. Coordinates are client
/// pixels, `at_ms` is the event timestamp since page load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove { x: f32, y: f32, at_ms: u64 },
    PointerDown { x: f32, y: f32, #[serde(default)] button: u8, at_ms: u64 },
    PointerUp { x: f32, y: f32, at_ms: u64 },
    Click { x: f32, y: f32, at_ms: u64 },
    /// `related_target` is false when the pointer left the window entirely
    PointerLeave { #[serde(default)] related_target: bool },
    PointerEnter,
    TouchStart { x: f32, y: f32, #[serde(default = "one")] touches: u32, at_ms: u64 },
    TouchMove { x: f32, y: f32, #[serde(default = "one")] touches: u32, at_ms: u64 },
    TouchEnd,
    TouchCancel,
}

fn one() -> u32 {
    1
}

// ============================================================================
// INTERACTION STATE
// ============================================================================

/// Center cube under the pointer and when the pointer arrived on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CenterHover {
    pub matrix: MatrixId,
    pub since: Duration,
}

/// Shared input state: written by the controller, read by the animator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionState {
    pub dragging: bool,
    pub last_pointer: Vec2,
    /// Pixels travelled since the last press, used to tell clicks from drags
    pub drag_travel: f32,
    /// Grid rotation increment of the last drag step: x about X, y about Y
    pub velocity: Vec2,
    pub idle: bool,
    /// Matrix whose hit sphere is under the pointer; its center cube grows
    pub hovered_matrix: Option<MatrixId>,
    /// Only feeds the click dwell timer
    pub hovered_center: Option<CenterHover>,
    pub dwell_threshold: Duration,
    pub layout: Layout,
}

impl InteractionState {
    pub fn new(config: &InteractionConfig, layout: Layout) -> Self {
        Self {
            dragging: false,
            last_pointer: Vec2::ZERO,
            drag_travel: 0.0,
            velocity: Vec2::ZERO,
            idle: false,
            hovered_matrix: None,
            hovered_center: None,
            dwell_threshold: Duration::from_millis(config.dwell_threshold_ms),
            layout,
        }
    }

    /// Largest rotation velocity component
    pub fn speed(&self) -> f32 {
        self.velocity.x.abs().max(self.velocity.y.abs())
    }
}

/// A center cube asked to open its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub matrix: MatrixId,
    pub page_id: String,
}

// ============================================================================
// PICKING
// ============================================================================

fn ray_at(scene: &SceneBundle, client: Vec2) -> Ray {
    scene.camera.ray(scene.viewport.to_ndc(client))
}

/// First matrix in traversal order whose hit sphere the ray crosses
pub fn pick_matrix(scene: &SceneBundle, ray: &Ray) -> Option<MatrixId> {
    scene.grid.iter().find_map(|(id, matrix)| {
        let (center, radius) = scene.grid.hit_sphere_world(matrix)?;
        ray.intersect_sphere(center, radius).map(|_| id)
    })
}

/// First matrix in traversal order whose center cube body the ray crosses
pub fn pick_center_cube(scene: &SceneBundle, ray: &Ray) -> Option<MatrixId> {
    scene.grid.iter().find_map(|(id, matrix)| {
        let transform = scene.grid.center_cube_transform(matrix);
        ray.intersect_cube(&transform, matrix.center_cube().size()).map(|_| id)
    })
}

// ============================================================================
// CONTROLLER
// ============================================================================

type HoverCallback = Box<dyn FnMut(Option<MatrixId>)>;

pub struct InteractionController {
    drag_sensitivity: f32,
    click_slop_px: f32,
    hover_changed: Option<HoverCallback>,
}

impl InteractionController {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            drag_sensitivity: config.drag_sensitivity,
            click_slop_px: config.click_slop_px,
            hover_changed: None,
        }
    }

    /// Called only when the hovered matrix actually changes
    pub fn on_hover_change<F>(&mut self, callback: F)
    where
        F: FnMut(Option<MatrixId>) + 'static,
    {
        self.hover_changed = Some(Box::new(callback));
    }

    /// Apply one input event. Returns a navigation request when a center cube
    /// was activated, or `PageUnbound` when it has nowhere to go.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        state: &mut InteractionState,
        scene: &mut SceneBundle,
        stage: &mut dyn Stage,
    ) -> Result<Option<NavigationRequest>> {
        match *event {
            InputEvent::PointerMove { x, y, at_ms } => {
                let p = Vec2::new(x, y);
                stage.move_cursor(p);
                state.idle = false;
                self.track_hover(state, scene, p, Duration::from_millis(at_ms));
                if state.dragging {
                    self.drag_to(state, scene, p);
                }
            }
            InputEvent::PointerDown { x, y, button, .. } => {
                if button == 0 {
                    self.start_drag(state, Vec2::new(x, y));
                }
            }
            InputEvent::PointerUp { .. } => {
                state.dragging = false;
            }
            InputEvent::Click { x, y, at_ms } => {
                return self.click(state, scene, Vec2::new(x, y), Duration::from_millis(at_ms));
            }
            InputEvent::PointerLeave { related_target } => {
                if !related_target {
                    debug!("Pointer left the window; going idle");
                    state.idle = true;
                }
            }
            InputEvent::PointerEnter => {
                state.idle = false;
            }
            InputEvent::TouchStart { x, y, touches, .. } => {
                if touches != 1 {
                    return Ok(None);
                }
                state.idle = false;
                let p = Vec2::new(x, y);
                // Touch has no hover, so a tap on a center cube commits at once
                if let Some(id) = pick_center_cube(scene, &ray_at(scene, p)) {
                    state.dragging = false;
                    return resolve_page(scene, id).map(Some);
                }
                self.start_drag(state, p);
            }
            InputEvent::TouchMove { x, y, touches, .. } => {
                if touches == 1 && state.dragging {
                    self.drag_to(state, scene, Vec2::new(x, y));
                }
            }
            InputEvent::TouchEnd | InputEvent::TouchCancel => {
                state.dragging = false;
            }
        }
        Ok(None)
    }

    fn start_drag(&mut self, state: &mut InteractionState, p: Vec2) {
        state.dragging = true;
        state.last_pointer = p;
        state.drag_travel = 0.0;
        state.velocity = Vec2::ZERO;
    }

    /// Rotate around whichever axis the motion is dominant on, never both
    fn drag_to(&mut self, state: &mut InteractionState, scene: &mut SceneBundle, p: Vec2) {
        let delta = p - state.last_pointer;
        state.drag_travel += delta.length();

        if delta.x.abs() > delta.y.abs() {
            let rot = delta.x * self.drag_sensitivity;
            scene.grid.rotation.y += rot;
            state.velocity = Vec2::new(0.0, rot);
        } else {
            let rot = delta.y * self.drag_sensitivity;
            scene.grid.rotation.x += rot;
            state.velocity = Vec2::new(rot, 0.0);
        }

        state.last_pointer = p;
    }

    fn track_hover(&mut self, state: &mut InteractionState, scene: &SceneBundle, p: Vec2, at: Duration) {
        let ray = ray_at(scene, p);

        let hovered = pick_matrix(scene, &ray);
        if hovered != state.hovered_matrix {
            state.hovered_matrix = hovered;
            if let Some(callback) = self.hover_changed.as_mut() {
                callback(hovered);
            }
        }

        let center = pick_center_cube(scene, &ray);
        state.hovered_center = match (state.hovered_center, center) {
            (Some(current), Some(id)) if current.matrix == id => Some(current),
            (_, Some(id)) => Some(CenterHover { matrix: id, since: at }),
            (_, None) => None,
        };
    }

    fn click(
        &mut self,
        state: &mut InteractionState,
        scene: &SceneBundle,
        p: Vec2,
        at: Duration,
    ) -> Result<Option<NavigationRequest>> {
        if state.drag_travel > self.click_slop_px {
            state.drag_travel = 0.0;
            return Ok(None);
        }

        self.track_hover(state, scene, p, at);
        let Some(hover) = state.hovered_center else {
            return Ok(None);
        };

        let dwelled = at.saturating_sub(hover.since);
        if dwelled < state.dwell_threshold {
            debug!(
                "Click on matrix {} after {:?} dwell, below {:?}",
                hover.matrix.0, dwelled, state.dwell_threshold
            );
            return Ok(None);
        }

        state.hovered_center = None;
        resolve_page(scene, hover.matrix).map(Some)
    }
}

fn resolve_page(scene: &SceneBundle, id: MatrixId) -> Result<NavigationRequest> {
    let matrix = scene
        .grid
        .matrix(id)
        .ok_or(AnimationError::PageUnbound { matrix: id.0 })?;

    match matrix.center_cube().page_id() {
        Some(page_id) => Ok(NavigationRequest {
            matrix: id,
            page_id: page_id.to_string(),
        }),
        None => {
            warn!("Center cube of matrix {} has no page bound", id.0);
            Err(AnimationError::PageUnbound { matrix: id.0 })
        }
    }
}
