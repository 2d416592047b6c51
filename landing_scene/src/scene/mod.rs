// scene/mod.rs - Scene assembly: camera, viewport and the grid of cube matrices

pub mod camera;
pub mod cube;
pub mod grid;
pub mod matrix;

pub use camera::*;
pub use cube::*;
pub use grid::*;
pub use matrix::*;

use glam::Vec3;
use log::{debug, info};
use rand::Rng;

use crate::config::{SceneConfig, GRID_DIM};
use crate::error_handling::{LandingError, Result};

/// Everything the animator and the interaction controller operate on
#[derive(Debug, Clone)]
pub struct SceneBundle {
    pub camera: Camera,
    pub viewport: Viewport,
    pub grid: SceneGrid,
}

impl SceneBundle {
    /// Build the camera and the 3x3 grid, then apply the initial resize
    pub fn assemble<R: Rng + ?Sized>(
        config: &SceneConfig,
        viewport: Viewport,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        check_viewport(viewport)?;

        let builder = MatrixBuilder::from_config(config);
        let spacing = config.lattice.matrix_spacing;
        let mid = (GRID_DIM / 2) as f32;

        let mut matrices = Vec::with_capacity(GRID_DIM * GRID_DIM);
        for i in 0..GRID_DIM {
            for j in 0..GRID_DIM {
                let slot = matrices.len();
                let page = config.pages.get(slot);
                let label = page
                    .and_then(|p| p.label.clone())
                    .map(|text| (text, config.lattice.label_font_size));

                let position = Vec3::new((i as f32 - mid) * spacing, (j as f32 - mid) * spacing, 0.0);
                let mut matrix = builder.clone().center_label(label).build(position, rng);
                if let Some(page) = page {
                    matrix.bind_page(page.id.clone())?;
                }
                matrices.push(matrix);
            }
        }

        let layout = Layout::for_width(viewport.width, config.interaction.breakpoint_px);
        let camera = Camera {
            fov_deg: config.camera.fov_deg,
            aspect: viewport.aspect(),
            near: config.camera.near,
            far: config.camera.far,
            position: Vec3::new(0.0, config.camera.height, config.camera.depth),
        };

        let mut bundle = Self {
            camera,
            viewport,
            grid: SceneGrid::new(matrices, layout),
        };
        bundle.resize(viewport, config)?;

        info!(
            "Assembled {} matrices ({} cubes) for {}x{} viewport",
            bundle.grid.len(),
            bundle.cube_count(),
            viewport.width,
            viewport.height
        );
        Ok(bundle)
    }

    pub fn layout(&self, config: &SceneConfig) -> Layout {
        Layout::for_width(self.viewport.width, config.interaction.breakpoint_px)
    }

    pub fn cube_count(&self) -> usize {
        self.grid.iter().map(|(_, m)| m.cubes().len()).sum()
    }

    /// React to a viewport change. The grid only receives a new target
    /// rotation; the animator eases toward it over the following frames.
    pub fn resize(&mut self, viewport: Viewport, config: &SceneConfig) -> Result<Layout> {
        check_viewport(viewport)?;
        let cam = &config.camera;

        let previous = self.layout(config);
        self.viewport = viewport;
        let layout = self.layout(config);
        if layout != previous {
            debug!("Layout {:?} -> {:?} at width {}", previous, layout, viewport.width);
        }
        self.grid.target_rotation_z = layout.target_rotation_z();

        self.camera.position.z = match layout {
            Layout::Compact => cam.depth * cam.compact_zoom,
            Layout::Desktop => cam.depth,
        };
        self.camera.aspect = viewport.aspect();
        self.camera.fov_deg = framing_fov(cam.fov_deg, self.camera.aspect, cam.max_fov_deg);

        Ok(layout)
    }
}

/// Vertical fov keeping a square viewport's horizontal framing on portrait screens
pub fn framing_fov(fov_deg: f32, aspect: f32, max_fov_deg: f32) -> f32 {
    if aspect >= 1.0 {
        return fov_deg;
    }
    let half = (fov_deg.to_radians() / 2.0).tan() / aspect;
    (2.0 * half.atan()).to_degrees().min(max_fov_deg)
}

fn check_viewport(viewport: Viewport) -> Result<()> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(LandingError::DegenerateViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(())
}
