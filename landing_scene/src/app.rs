// app.rs - Landing scene coordinator: owns the scene, input state, animator and fades

use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::animation::{AnimationError, FrameAnimator, PageTarget, PageTransition, TransitionPhase};
use crate::config::SceneConfig;
use crate::error_handling::Result;
use crate::interaction::{CenterHover, InputEvent, InteractionController, InteractionState};
use crate::scene::{Layout, MatrixId, SceneBundle, Viewport};
use crate::stage::Stage;

/// What an input event led to
#[derive(Debug)]
pub enum InputOutcome {
    /// Canvas hidden or overlay blocking; only the cursor moved
    Ignored,
    Handled,
    /// A fade toward the page started; the receiver fires when it settles
    Navigating {
        page_id: String,
        done: oneshot::Receiver<()>,
    },
    /// A center cube was activated but has no page bound
    Unbound { matrix: MatrixId },
}

/// Per-center-cube state worth inspecting from outside
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterSnapshot {
    pub matrix: MatrixId,
    pub page_id: Option<String>,
    pub position: Vec3,
    pub scale: f32,
}

/// Serializable view of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub elapsed_ms: u64,
    pub layout: Layout,
    pub grid_rotation: Vec3,
    pub velocity: Vec2,
    pub dragging: bool,
    pub idle: bool,
    pub hovered_matrix: Option<MatrixId>,
    pub hovered_center: Option<CenterHover>,
    pub transition: TransitionPhase,
    pub showing: PageTarget,
    pub centers: Vec<CenterSnapshot>,
}

/// Single entry point for input, frame ticks, resizes and back navigation
pub struct LandingApp<S: Stage> {
    config: SceneConfig,
    scene: SceneBundle,
    state: InteractionState,
    controller: InteractionController,
    animator: FrameAnimator,
    transition: PageTransition,
    stage: S,
    rng: StdRng,
    elapsed: Duration,
}

impl<S: Stage> LandingApp<S> {
    pub fn new(config: SceneConfig, viewport: Viewport, stage: S) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let scene = SceneBundle::assemble(&config, viewport, &mut rng)?;
        let layout = scene.layout(&config);
        let mut controller = InteractionController::new(&config.interaction);
        controller.on_hover_change(|hovered| match hovered {
            Some(id) => debug!("Hovering matrix {}", id.0),
            None => debug!("Hover cleared"),
        });

        for page in &config.pages {
            if !stage.has_page(&page.id) {
                warn!("Page '{}' is bound to a center cube but missing from the stage", page.id);
            }
        }

        info!("Landing scene ready ({:?} layout)", layout);
        Ok(Self {
            state: InteractionState::new(&config.interaction, layout),
            animator: FrameAnimator::new(&config.animation),
            transition: PageTransition::new(&config.transition),
            controller,
            scene,
            stage,
            rng,
            config,
            elapsed: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneBundle {
        &self.scene
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn transition(&self) -> &PageTransition {
        &self.transition
    }

    pub fn frames(&self) -> u64 {
        self.animator.frames()
    }

    fn accepts_pointer(&self) -> bool {
        !self.transition.is_active() && *self.transition.showing() == PageTarget::Canvas
    }

    /// Apply one input event in delivery order
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<InputOutcome> {
        if !self.accepts_pointer() {
            if let InputEvent::PointerMove { x, y, .. } = *event {
                self.stage.move_cursor(Vec2::new(x, y));
            }
            return Ok(InputOutcome::Ignored);
        }

        let request = match self
            .controller
            .handle(event, &mut self.state, &mut self.scene, &mut self.stage)
        {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(InputOutcome::Handled),
            Err(AnimationError::PageUnbound { matrix }) => {
                warn!("Ignoring activation of matrix {}: no page bound", matrix);
                return Ok(InputOutcome::Unbound { matrix: MatrixId(matrix) });
            }
            Err(e) => return Err(e.into()),
        };

        info!("Navigating from matrix {} to '{}'", request.matrix.0, request.page_id);
        let done = self
            .transition
            .begin(PageTarget::Page(request.page_id.clone()), &self.stage)?;
        self.state.dragging = false;
        Ok(InputOutcome::Navigating {
            page_id: request.page_id,
            done,
        })
    }

    /// Advance one display frame
    pub fn frame(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.transition.update(dt, &mut self.stage);
        self.animator.step(&mut self.state, &mut self.scene, &mut self.rng);
    }

    /// New window size; the layout rotation follows over the next frames
    pub fn resize(&mut self, viewport: Viewport) -> Result<Layout> {
        let layout = self.scene.resize(viewport, &self.config)?;
        if layout != self.state.layout {
            info!("Switched to {:?} layout at {}x{}", layout, viewport.width, viewport.height);
            self.state.layout = layout;
        }
        Ok(layout)
    }

    /// Fade back to the canvas from a content page. `None` when the canvas
    /// is already showing.
    pub fn back(&mut self) -> Result<Option<oneshot::Receiver<()>>> {
        if *self.transition.showing() == PageTarget::Canvas && !self.transition.is_active() {
            return Ok(None);
        }
        let done = self.transition.begin(PageTarget::Canvas, &self.stage)?;
        Ok(Some(done))
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let centers = self
            .scene
            .grid
            .iter()
            .map(|(id, matrix)| {
                let cube = matrix.center_cube();
                CenterSnapshot {
                    matrix: id,
                    page_id: cube.page_id().map(str::to_string),
                    position: cube.position,
                    scale: cube.scale.x,
                }
            })
            .collect();

        FrameSnapshot {
            frame: self.animator.frames(),
            elapsed_ms: self.elapsed.as_millis() as u64,
            layout: self.state.layout,
            grid_rotation: self.scene.grid.rotation,
            velocity: self.state.velocity,
            dragging: self.state.dragging,
            idle: self.state.idle,
            hovered_matrix: self.state.hovered_matrix,
            hovered_center: self.state.hovered_center,
            transition: self.transition.phase(),
            showing: self.transition.showing().clone(),
            centers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::error_handling::LandingError;
    use crate::stage::HeadlessStage;
    use std::f32::consts::FRAC_PI_4;

    const FRAME: Duration = Duration::from_millis(16);

    fn app_with(config: SceneConfig, width: u32) -> LandingApp<HeadlessStage> {
        let stage = HeadlessStage::new(config.pages.iter().map(|p| p.id.clone()));
        LandingApp::new(config, Viewport::new(width, 800), stage).unwrap()
    }

    fn app() -> LandingApp<HeadlessStage> {
        let mut config = SceneConfig::default();
        config.seed = Some(42);
        app_with(config, 1280)
    }

    fn settle(app: &mut LandingApp<HeadlessStage>) {
        for _ in 0..200 {
            app.frame(FRAME);
            if !app.transition().is_active() {
                break;
            }
        }
    }

    /// Client position of a world point
    fn project(app: &LandingApp<HeadlessStage>, world: Vec3) -> Vec2 {
        let scene = app.scene();
        let clip = scene.camera.view_projection() * world.extend(1.0);
        let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
        let size = scene.viewport.size();
        Vec2::new((ndc.x + 1.0) / 2.0 * size.x, (1.0 - ndc.y) / 2.0 * size.y)
    }

    /// Client position of a matrix's center cube
    fn screen_of(app: &LandingApp<HeadlessStage>, id: MatrixId) -> Vec2 {
        let grid = &app.scene().grid;
        let matrix = grid.matrix(id).unwrap();
        project(app, grid.center_cube_transform(matrix).transform_point3(Vec3::ZERO))
    }

    fn move_to(p: Vec2, at_ms: u64) -> InputEvent {
        InputEvent::PointerMove { x: p.x, y: p.y, at_ms }
    }

    fn click_at(p: Vec2, at_ms: u64) -> InputEvent {
        InputEvent::Click { x: p.x, y: p.y, at_ms }
    }

    #[test]
    fn test_dwell_click_navigates_exactly_once() {
        let mut app = app();
        let target = screen_of(&app, MatrixId(4));

        app.handle_input(&move_to(target, 0)).unwrap();
        let outcome = app.handle_input(&click_at(target, 400)).unwrap();
        let (page_id, mut done) = match outcome {
            InputOutcome::Navigating { page_id, done } => (page_id, done),
            other => panic!("expected navigation, got {other:?}"),
        };
        assert_eq!(page_id, "page5");

        // overlay now swallows further clicks
        app.frame(FRAME);
        assert!(matches!(app.handle_input(&click_at(target, 900)).unwrap(), InputOutcome::Ignored));

        settle(&mut app);
        assert!(done.try_recv().is_ok());
        assert!(!app.stage().canvas_visible);
        assert_eq!(app.stage().visible_page(), Some("page5"));

        // page is showing: the canvas ignores input until back()
        assert!(matches!(app.handle_input(&click_at(target, 2_000)).unwrap(), InputOutcome::Ignored));
    }

    #[test]
    fn test_hovering_hit_sphere_brings_center_forward() {
        let mut app = app();
        let (sphere, _) = {
            let grid = &app.scene().grid;
            grid.hit_sphere_world(grid.matrix(MatrixId(4)).unwrap()).unwrap()
        };
        let target = project(&app, sphere);

        app.handle_input(&move_to(target, 0)).unwrap();
        assert_eq!(app.state().hovered_matrix, Some(MatrixId(4)));
        assert!(app.state().hovered_center.is_none());

        for _ in 0..200 {
            app.frame(FRAME);
        }
        let grid = &app.scene().grid;
        let center = grid.matrix(MatrixId(4)).unwrap().center_cube();
        assert!((center.scale - Vec3::splat(3.0)).length() < 1e-3, "scale {:?}", center.scale);
        let idle = grid.matrix(MatrixId(0)).unwrap().center_cube();
        assert!((idle.scale - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn test_switching_center_before_threshold_suppresses_navigation() {
        let mut app = app();
        let a = screen_of(&app, MatrixId(4));
        let b = screen_of(&app, MatrixId(1));

        app.handle_input(&move_to(a, 0)).unwrap();
        app.handle_input(&move_to(b, 200)).unwrap();
        let outcome = app.handle_input(&click_at(b, 400)).unwrap();
        assert!(matches!(outcome, InputOutcome::Handled));
        assert!(!app.transition().is_active());
    }

    #[test]
    fn test_back_restores_canvas_from_any_page() {
        for page in ["page1", "page9"] {
            let mut app = app();
            let done = app
                .transition
                .begin(PageTarget::Page(page.into()), &app.stage)
                .unwrap();
            drop(done);
            settle(&mut app);
            assert_eq!(app.stage().visible_page(), Some(page));

            let mut back = app.back().unwrap().unwrap();
            settle(&mut app);
            assert!(back.try_recv().is_ok());
            assert!(app.stage().canvas_visible);
            assert!(app.stage().pages.values().all(|v| !v));
            assert!(app.back().unwrap().is_none());
        }
    }

    #[test]
    fn test_back_while_fading_is_rejected() {
        let mut app = app();
        app.transition
            .begin(PageTarget::Page("page2".into()), &app.stage)
            .unwrap();
        app.frame(FRAME);
        let err = app.back().unwrap_err();
        assert!(matches!(
            err,
            LandingError::Animation(AnimationError::TransitionInFlight { .. })
        ));
    }

    #[test]
    fn test_resize_across_breakpoint_applies_gradually() {
        let mut app = app();
        assert_eq!(app.scene().grid.rotation.z, -FRAC_PI_4);

        assert_eq!(app.resize(Viewport::new(480, 800)).unwrap(), Layout::Compact);
        assert_eq!(app.state().layout, Layout::Compact);
        assert_eq!(app.scene().grid.rotation.z, -FRAC_PI_4);

        app.frame(FRAME);
        let z = app.scene().grid.rotation.z;
        assert!(z > -FRAC_PI_4 && z < 0.0);
        for _ in 0..400 {
            app.frame(FRAME);
        }
        assert!(app.scene().grid.rotation.z.abs() < 1e-4);

        app.resize(Viewport::new(1024, 800)).unwrap();
        for _ in 0..400 {
            app.frame(FRAME);
        }
        assert!((app.scene().grid.rotation.z + FRAC_PI_4).abs() < 1e-4);
    }

    #[test]
    fn test_idle_divergence_is_monotonic() {
        let mut app = app();
        app.handle_input(&InputEvent::PointerLeave { related_target: false }).unwrap();

        let distances = |app: &LandingApp<HeadlessStage>| -> Vec<f32> {
            app.scene()
                .grid
                .iter()
                .flat_map(|(_, m)| m.cubes().iter())
                .map(|c| c.position.distance(c.rest_position()))
                .collect()
        };

        let mut previous = distances(&app);
        for _ in 0..40 {
            app.frame(FRAME);
            let current = distances(&app);
            assert!(current.iter().zip(&previous).all(|(now, before)| now >= before));
            previous = current;
        }

        app.handle_input(&InputEvent::PointerEnter).unwrap();
        app.frame(FRAME);
        let after = distances(&app);
        assert!(after.iter().zip(&previous).all(|(now, before)| now <= before));
    }

    #[test]
    fn test_drag_sets_dominant_axis_velocity() {
        let mut app = app();
        app.handle_input(&InputEvent::PointerDown { x: 300.0, y: 300.0, button: 0, at_ms: 0 })
            .unwrap();
        app.handle_input(&InputEvent::PointerMove { x: 310.0, y: 302.0, at_ms: 16 })
            .unwrap();

        let snap = app.snapshot();
        assert!(snap.dragging);
        assert_eq!(snap.velocity.x, 0.0);
        assert!((snap.velocity.y - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_unbound_center_is_reported_not_fatal() {
        let mut config = SceneConfig::default();
        config.pages = vec![PageConfig { id: "first".into(), label: Some("First".into()) }];
        let mut app = app_with(config, 1280);
        let target = screen_of(&app, MatrixId(4));

        app.handle_input(&move_to(target, 0)).unwrap();
        let outcome = app.handle_input(&click_at(target, 500)).unwrap();
        assert!(matches!(outcome, InputOutcome::Unbound { matrix: MatrixId(4) }));
        assert!(!app.transition().is_active());
    }

    #[test]
    fn test_negative_idle_velocity_never_reaches_animator() {
        let mut config = SceneConfig::default();
        config.animation.idle_velocity_magnitude = -0.3;
        let stage = HeadlessStage::new(config.pages.iter().map(|p| p.id.clone()));
        let err = LandingApp::new(config, Viewport::new(1280, 800), stage).err();
        assert!(matches!(err, Some(LandingError::InvalidConfig { .. })));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut app = app();
        app.frame(FRAME);
        let snap = app.snapshot();
        assert_eq!(snap.frame, 1);
        assert_eq!(snap.centers.len(), 9);
        assert_eq!(snap.centers[0].page_id.as_deref(), Some("page1"));

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["layout"], "desktop");
        assert_eq!(json["transition"], "idle");
        assert_eq!(json["showing"]["kind"], "canvas");
    }
}
