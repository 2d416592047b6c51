// scene/grid.rs - 3x3 arrangement of matrices sharing one rotation

use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_4;

use super::matrix::Matrix;

/// Handle to a matrix in the grid. Holding one never keeps a matrix alive;
/// resolve it through [`SceneGrid::matrix`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatrixId(pub usize);

/// Responsive layout, switched at the width breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Grid rotated 45 degrees, matrices independent
    #[default]
    Desktop,
    /// Grid upright, cubes merged toward their matrix center
    Compact,
}

impl Layout {
    pub fn for_width(width: u32, breakpoint_px: u32) -> Self {
        if width < breakpoint_px {
            Layout::Compact
        } else {
            Layout::Desktop
        }
    }

    /// Grid rotation about the depth axis this layout eases toward
    pub fn target_rotation_z(self) -> f32 {
        match self {
            Layout::Desktop => -FRAC_PI_4,
            Layout::Compact => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneGrid {
    matrices: Vec<Matrix>,
    /// Euler angles (XYZ order); x/y come from dragging, z from the layout
    pub rotation: Vec3,
    pub target_rotation_z: f32,
}

impl SceneGrid {
    pub fn new(matrices: Vec<Matrix>, layout: Layout) -> Self {
        Self {
            matrices,
            rotation: Vec3::new(0.0, 0.0, layout.target_rotation_z()),
            target_rotation_z: layout.target_rotation_z(),
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn matrix(&self, id: MatrixId) -> Option<&Matrix> {
        self.matrices.get(id.0)
    }

    /// Matrices with their handles, in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (MatrixId, &Matrix)> {
        self.matrices.iter().enumerate().map(|(i, m)| (MatrixId(i), m))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MatrixId, &mut Matrix)> {
        self.matrices.iter_mut().enumerate().map(|(i, m)| (MatrixId(i), m))
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Matrix-local to world
    pub fn matrix_transform(&self, matrix: &Matrix) -> Affine3A {
        Affine3A::from_quat(self.orientation()) * Affine3A::from_translation(matrix.position)
    }

    /// Center cube body transform in world space
    pub fn center_cube_transform(&self, matrix: &Matrix) -> Affine3A {
        let cube = matrix.center_cube();
        self.matrix_transform(matrix)
            * Affine3A::from_scale_rotation_translation(cube.scale, cube.orientation, cube.position)
    }

    /// Hit sphere center and radius in world space
    pub fn hit_sphere_world(&self, matrix: &Matrix) -> Option<(Vec3, f32)> {
        let hit = matrix.hit_volume()?;
        let center = self.matrix_transform(matrix).transform_point3(hit.center);
        Some((center, hit.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MatrixBuilder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(layout: Layout) -> SceneGrid {
        let mut rng = StdRng::seed_from_u64(3);
        let builder = MatrixBuilder::new(3, 4.0);
        let matrices = vec![
            builder.build(Vec3::ZERO, &mut rng),
            builder.build(Vec3::new(15.0, 0.0, 0.0), &mut rng),
        ];
        SceneGrid::new(matrices, layout)
    }

    #[test]
    fn test_layout_for_width() {
        assert_eq!(Layout::for_width(599, 600), Layout::Compact);
        assert_eq!(Layout::for_width(600, 600), Layout::Desktop);
        assert_eq!(Layout::Desktop.target_rotation_z(), -FRAC_PI_4);
        assert_eq!(Layout::Compact.target_rotation_z(), 0.0);
    }

    #[test]
    fn test_stale_handle_resolves_to_none() {
        let g = grid(Layout::Desktop);
        assert!(g.matrix(MatrixId(1)).is_some());
        assert!(g.matrix(MatrixId(9)).is_none());
    }

    #[test]
    fn test_matrix_transform_applies_grid_rotation() {
        let mut g = grid(Layout::Compact);
        let m = g.matrix(MatrixId(1)).unwrap().clone();
        let p = g.matrix_transform(&m).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(15.0, 0.0, 0.0)).length() < 1e-5);

        g.rotation.z = std::f32::consts::FRAC_PI_2;
        let p = g.matrix_transform(&m).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 15.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_hit_sphere_world_position() {
        let g = grid(Layout::Compact);
        let m = g.matrix(MatrixId(1)).unwrap();
        let (center, radius) = g.hit_sphere_world(m).unwrap();
        assert!((center - Vec3::new(15.0, -5.0, 0.0)).length() < 1e-5);
        assert_eq!(radius, 6.0);
    }
}
