// config.rs - Scene tunables, loaded once at startup
// Every field has a default so a partial JSON file only overrides what it names.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use std::path::Path;

use crate::animation::{Color, Easing};
use crate::error_handling::{invalid_config, Result};

/// Matrices per side of the scene grid
pub const GRID_DIM: usize = 3;

/// Default cubes per side of a matrix
pub const DEFAULT_LATTICE_DIM: usize = 3;

const_assert!(GRID_DIM % 2 == 1);
const_assert!(DEFAULT_LATTICE_DIM % 2 == 1);

/// Complete scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub lattice: LatticeConfig,
    pub palette: Palette,
    pub animation: AnimationTuning,
    pub interaction: InteractionConfig,
    pub transition: TransitionConfig,
    /// Pages bound to center cubes, in grid traversal order
    pub pages: Vec<PageConfig>,
    /// Seed for rotation speeds and idle drift; random when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Camera distance along +Z in the desktop layout
    pub depth: f32,
    pub height: f32,
    /// Depth multiplier applied below the breakpoint
    pub compact_zoom: f32,
    /// Upper bound when widening the fov for portrait viewports
    pub max_fov_deg: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub dim: usize,
    pub cube_size: f32,
    pub cube_spacing: f32,
    pub matrix_spacing: f32,
    /// Lattice cell left empty, e.g. `[1, 1, 2]` for the front-center gap
    pub skip_cell: Option<[usize; 3]>,
    pub hit_radius: f32,
    /// Hit sphere center relative to the center cube
    pub hit_offset: Vec3,
    pub label_font_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub cube: Color,
    pub outline: Color,
    pub center: Color,
    pub edge_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTuning {
    pub explode_threshold: f32,
    pub explode_gain: f32,
    pub max_explode_strength: f32,
    pub hover_explode_push: f32,
    pub center_hover_scale: f32,
    pub center_normal_scale: f32,
    pub scale_lerp_speed: f32,
    pub position_lerp_speed: f32,
    pub idle_velocity_magnitude: f32,
    pub idle_spin: f32,
    pub friction: f32,
    pub recenter_speed: f32,
    pub layout_rotation_speed: f32,
    /// Fraction of the rest offset kept when cubes merge in the compact layout
    pub compact_merge: f32,
    pub compact_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub breakpoint_px: u32,
    /// Radians of grid rotation per pixel of drag
    pub drag_sensitivity: f32,
    pub dwell_threshold_ms: u64,
    pub click_slop_px: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub fade_duration_ms: u64,
    pub easing: Easing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub id: String,
    /// Text rasterized onto the center cube faces
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            depth: 50.0,
            height: 0.0,
            compact_zoom: 1.3,
            max_fov_deg: 120.0,
        }
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            dim: DEFAULT_LATTICE_DIM,
            cube_size: 2.0,
            cube_spacing: 4.0,
            matrix_spacing: 15.0,
            skip_cell: None,
            hit_radius: 6.0,
            hit_offset: Vec3::new(0.0, -5.0, 0.0),
            label_font_size: 48.0,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            cube: Color::WHITE,
            outline: Color::BLACK,
            center: Color::RED,
            edge_width: 2.0,
        }
    }
}

impl Default for AnimationTuning {
    fn default() -> Self {
        Self {
            explode_threshold: 0.07,
            explode_gain: 100.0,
            max_explode_strength: 100.0,
            hover_explode_push: 3.0,
            center_hover_scale: 3.0,
            center_normal_scale: 1.0,
            scale_lerp_speed: 0.1,
            position_lerp_speed: 0.07,
            idle_velocity_magnitude: 0.3,
            idle_spin: 0.01,
            friction: 0.98,
            recenter_speed: 0.05,
            layout_rotation_speed: 0.05,
            compact_merge: 0.35,
            compact_scale: 0.6,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            breakpoint_px: 600,
            drag_sensitivity: 0.005,
            dwell_threshold_ms: 350,
            click_slop_px: 4.0,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 400,
            easing: Easing::SineInOut,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            lattice: LatticeConfig::default(),
            palette: Palette::default(),
            animation: AnimationTuning::default(),
            interaction: InteractionConfig::default(),
            transition: TransitionConfig::default(),
            pages: (1..=GRID_DIM * GRID_DIM)
                .map(|i| PageConfig { id: format!("page{i}"), label: None })
                .collect(),
            seed: None,
        }
    }
}

impl SceneConfig {
    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SceneConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Index of the lattice midpoint along each axis
    pub fn center_index(&self) -> usize {
        self.lattice.dim / 2
    }

    /// Check value ranges that would otherwise degrade silently
    pub fn validate(&self) -> Result<()> {
        let cam = &self.camera;
        if !(cam.fov_deg > 0.0 && cam.fov_deg < 180.0) {
            return Err(invalid_config(format!("fov_deg {} outside (0, 180)", cam.fov_deg)));
        }
        if cam.max_fov_deg < cam.fov_deg || cam.max_fov_deg >= 180.0 {
            return Err(invalid_config("max_fov_deg must lie in [fov_deg, 180)"));
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return Err(invalid_config(format!("near {} / far {} out of order", cam.near, cam.far)));
        }
        if cam.compact_zoom <= 0.0 {
            return Err(invalid_config("compact_zoom must be positive"));
        }

        let lat = &self.lattice;
        if lat.dim == 0 || lat.dim % 2 == 0 {
            return Err(invalid_config(format!("lattice dim {} must be odd", lat.dim)));
        }
        if lat.cube_size <= 0.0 || lat.cube_spacing <= 0.0 || lat.matrix_spacing <= 0.0 {
            return Err(invalid_config("cube size and spacings must be positive"));
        }
        if lat.hit_radius <= 0.0 {
            return Err(invalid_config("hit_radius must be positive"));
        }
        if let Some(cell) = lat.skip_cell {
            if cell.iter().any(|&i| i >= lat.dim) {
                return Err(invalid_config(format!("skip_cell {cell:?} outside lattice")));
            }
            let c = self.center_index();
            if cell == [c, c, c] {
                return Err(invalid_config("skip_cell cannot remove the center cube"));
            }
        }

        let anim = &self.animation;
        for (name, speed) in [
            ("scale_lerp_speed", anim.scale_lerp_speed),
            ("position_lerp_speed", anim.position_lerp_speed),
            ("recenter_speed", anim.recenter_speed),
            ("layout_rotation_speed", anim.layout_rotation_speed),
            ("friction", anim.friction),
        ] {
            if !(speed > 0.0 && speed <= 1.0) {
                return Err(invalid_config(format!("{name} must be in (0, 1], got {speed}")));
            }
        }
        if !(anim.idle_velocity_magnitude.is_finite() && anim.idle_velocity_magnitude >= 0.0) {
            return Err(invalid_config(format!(
                "idle_velocity_magnitude must be finite and >= 0, got {}",
                anim.idle_velocity_magnitude
            )));
        }
        if !anim.idle_spin.is_finite() {
            return Err(invalid_config("idle_spin must be finite"));
        }
        if anim.compact_merge < 0.0 || anim.compact_scale <= 0.0 {
            return Err(invalid_config("compact_merge must be >= 0 and compact_scale > 0"));
        }

        if self.interaction.breakpoint_px == 0 {
            return Err(invalid_config("breakpoint_px must be positive"));
        }
        if self.pages.len() > GRID_DIM * GRID_DIM {
            return Err(invalid_config(format!(
                "{} pages configured but the grid has {} center cubes",
                self.pages.len(),
                GRID_DIM * GRID_DIM
            )));
        }

        Ok(())
    }
}
