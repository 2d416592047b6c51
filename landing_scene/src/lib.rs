// lib.rs - Library exports for the cube-matrix landing scene
// Scene composition, per-frame animation, interaction and page transitions

pub mod animation;
pub mod app;
pub mod config;
pub mod error_handling;
pub mod interaction;
pub mod render;
pub mod scene;
pub mod script;
pub mod stage;

// Re-export commonly used types
pub use animation::{AnimationError, Color, Easing, FrameAnimator, PageTarget, PageTransition, Tween};
pub use app::{FrameSnapshot, InputOutcome, LandingApp};
pub use config::SceneConfig;
pub use error_handling::{LandingError, Result};
pub use interaction::{InputEvent, InteractionController, InteractionState, NavigationRequest};
pub use render::WireframeRenderer;
pub use scene::{Layout, MatrixId, SceneBundle, Viewport};
pub use script::{InputScript, ScriptAction, WindowAction};
pub use stage::{HeadlessStage, Stage};
