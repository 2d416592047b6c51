// scene/matrix.rs - Lattice of cubes around one interactive center cube

use glam::Vec3;
use rand::Rng;

use super::cube::{CubeBuilder, CubeRecord};
use crate::animation::{Color, Result};
use crate::config::SceneConfig;

/// Invisible raycast target attached near the center cube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSphere {
    /// Center in matrix-local coordinates
    pub center: Vec3,
    pub radius: f32,
    /// Always zero; the sphere is hit-tested, never seen
    pub opacity: f32,
}

/// One lattice of cubes. Cubes are stored in x-major, then y, then z order.
#[derive(Debug, Clone)]
pub struct Matrix {
    cubes: Vec<CubeRecord>,
    center: usize,
    pub position: Vec3,
    hit_volume: Option<HitSphere>,
}

impl Matrix {
    pub fn cubes(&self) -> &[CubeRecord] {
        &self.cubes
    }

    pub fn cubes_mut(&mut self) -> &mut [CubeRecord] {
        &mut self.cubes
    }

    pub fn center_index(&self) -> usize {
        self.center
    }

    pub fn center_cube(&self) -> &CubeRecord {
        &self.cubes[self.center]
    }

    pub fn center_cube_mut(&mut self) -> &mut CubeRecord {
        &mut self.cubes[self.center]
    }

    pub fn hit_volume(&self) -> Option<&HitSphere> {
        self.hit_volume.as_ref()
    }

    pub fn bind_page(&mut self, page_id: impl Into<String>) -> Result<()> {
        self.center_cube_mut().bind_page(page_id)
    }
}

/// Parameterized builder covering the full, gapped and labelled lattice variants
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    dim: usize,
    spacing: f32,
    skip_cell: Option<[usize; 3]>,
    cube: CubeBuilder,
    center_color: Color,
    center_label: Option<(String, f32)>,
    hit_radius: f32,
    hit_offset: Vec3,
}

impl MatrixBuilder {
    pub fn new(dim: usize, spacing: f32) -> Self {
        Self {
            dim,
            spacing,
            skip_cell: None,
            cube: CubeBuilder::new(2.0).fill(Color::WHITE).edge(Color::BLACK, 2.0),
            center_color: Color::RED,
            center_label: None,
            hit_radius: 6.0,
            hit_offset: Vec3::new(0.0, -5.0, 0.0),
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        let lattice = &config.lattice;
        let palette = &config.palette;
        Self {
            dim: lattice.dim,
            spacing: lattice.cube_spacing,
            skip_cell: lattice.skip_cell,
            cube: CubeBuilder::new(lattice.cube_size)
                .fill(palette.cube)
                .edge(palette.outline, palette.edge_width),
            center_color: palette.center,
            center_label: None,
            hit_radius: lattice.hit_radius,
            hit_offset: lattice.hit_offset,
        }
    }

    pub fn skip_cell(mut self, cell: Option<[usize; 3]>) -> Self {
        self.skip_cell = cell;
        self
    }

    pub fn center_label(mut self, label: Option<(String, f32)>) -> Self {
        self.center_label = label;
        self
    }

    fn lattice_offset(&self, index: usize) -> f32 {
        (index as f32 - (self.dim as f32 - 1.0) / 2.0) * self.spacing
    }

    pub fn build<R: Rng + ?Sized>(&self, position: Vec3, rng: &mut R) -> Matrix {
        let mid = self.dim / 2;
        let mut cubes = Vec::with_capacity(self.dim.pow(3));
        let mut center = 0;
        // The center cube is never skipped
        let skip = self.skip_cell.filter(|cell| *cell != [mid; 3]);

        for x in 0..self.dim {
            for y in 0..self.dim {
                for z in 0..self.dim {
                    if skip == Some([x, y, z]) {
                        continue;
                    }

                    let rest = Vec3::new(
                        self.lattice_offset(x),
                        self.lattice_offset(y),
                        self.lattice_offset(z),
                    );
                    let is_center = x == mid && y == mid && z == mid;

                    let mut builder = self.cube.clone().at(rest).center(is_center);
                    if is_center {
                        center = cubes.len();
                        builder = builder.fill(self.center_color);
                        if let Some((text, size)) = &self.center_label {
                            builder = builder.label(text.clone(), *size);
                        }
                    }
                    cubes.push(builder.build(rng));
                }
            }
        }

        let hit_volume = HitSphere {
            center: cubes[center].rest_position() + self.hit_offset,
            radius: self.hit_radius,
            opacity: 0.0,
        };

        Matrix {
            cubes,
            center,
            position,
            hit_volume: Some(hit_volume),
        }
    }
}
