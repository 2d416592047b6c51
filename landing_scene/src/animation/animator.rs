// animation/animator.rs - Per-frame cube animation: explode, hover, idle drift, inertia

use glam::{Mat3, Quat, Vec3};
use log::trace;
use rand::Rng;

use super::lerp;
use crate::config::AnimationTuning;
use crate::interaction::InteractionState;
use crate::scene::{Layout, MatrixId, SceneBundle};

/// Velocity below which inertia snaps to rest
const VELOCITY_EPSILON: f32 = 1e-5;

/// Drives every cube toward its per-frame target. Frame-count based: each call
/// to [`FrameAnimator::step`] is one display frame regardless of wall time.
#[derive(Debug, Clone)]
pub struct FrameAnimator {
    tuning: AnimationTuning,
    frames: u64,
}

impl FrameAnimator {
    pub fn new(tuning: &AnimationTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one frame
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        state: &mut InteractionState,
        scene: &mut SceneBundle,
        rng: &mut R,
    ) {
        self.frames += 1;
        self.animate_cubes(state, scene, rng);
        self.animate_grid(state, scene);
    }

    fn animate_cubes<R: Rng + ?Sized>(
        &self,
        state: &InteractionState,
        scene: &mut SceneBundle,
        rng: &mut R,
    ) {
        let t = &self.tuning;
        let compact = state.layout == Layout::Compact;
        let speed = state.speed();
        let explode = (speed > t.explode_threshold)
            .then(|| (speed * t.explode_gain).min(t.max_explode_strength));
        let resolution = scene.viewport.size();
        let camera_position = scene.camera.position;

        // Camera position in each matrix's local frame, for the look-at target
        let local_cameras: Vec<Vec3> = scene
            .grid
            .iter()
            .map(|(_, m)| {
                scene
                    .grid
                    .matrix_transform(m)
                    .inverse()
                    .transform_point3(camera_position)
            })
            .collect();

        for (id, matrix) in scene.grid.iter_mut() {
            let MatrixId(index) = id;
            // The center cube answers to its matrix's hit sphere; the push is desktop only
            let center_hovered = state.hovered_matrix == Some(id);
            let matrix_hovered = !compact && center_hovered;

            for cube in matrix.cubes_mut() {
                let mut target = if compact {
                    cube.rest_position() * t.compact_merge
                } else {
                    cube.rest_position()
                };

                if !state.idle {
                    if let Some(strength) = explode {
                        target += cube.explode_direction() * strength;
                    }
                    if matrix_hovered {
                        target += cube.explode_direction() * t.hover_explode_push;
                    }
                }

                let target_scale = if cube.is_center() {
                    if center_hovered {
                        t.center_hover_scale
                    } else {
                        t.center_normal_scale
                    }
                } else if compact {
                    t.compact_scale
                } else {
                    1.0
                };
                cube.scale = cube.scale.lerp(Vec3::splat(target_scale), t.scale_lerp_speed);

                if state.idle {
                    let drift = *cube.idle_velocity.get_or_insert_with(|| {
                        let half = t.idle_velocity_magnitude / 2.0;
                        Vec3::new(
                            rng.gen_range(-half..=half),
                            rng.gen_range(-half..=half),
                            rng.gen_range(-half..=half),
                        )
                    });
                    cube.position += drift;
                } else {
                    cube.idle_velocity = None;
                    cube.position = cube.position.lerp(target, t.position_lerp_speed);
                }

                let spin = cube.rotation_speed();
                let extra = if state.idle { t.idle_spin } else { 0.0 };
                cube.spin(spin.x + extra, spin.y + extra);

                if cube.is_center() && center_hovered {
                    if let Some(facing) = look_at(local_cameras[index] - cube.position) {
                        cube.orientation = cube.orientation.slerp(facing, t.scale_lerp_speed).normalize();
                    }
                }

                cube.set_outline_resolution(resolution);
            }
        }
    }

    fn animate_grid(&self, state: &mut InteractionState, scene: &mut SceneBundle) {
        let t = &self.tuning;
        let grid = &mut scene.grid;

        if !state.dragging && !state.idle {
            grid.rotation.x += state.velocity.x;
            grid.rotation.y += state.velocity.y;
            state.velocity *= t.friction;
            if state.velocity.x.abs() < VELOCITY_EPSILON {
                state.velocity.x = 0.0;
            }
            if state.velocity.y.abs() < VELOCITY_EPSILON {
                state.velocity.y = 0.0;
            }
        }

        if !state.dragging {
            grid.rotation.x = lerp(grid.rotation.x, 0.0, t.recenter_speed);
            grid.rotation.y = lerp(grid.rotation.y, 0.0, t.recenter_speed);
        }

        grid.rotation.z = lerp(grid.rotation.z, grid.target_rotation_z, t.layout_rotation_speed);

        trace!(
            "frame {}: grid rotation {:?}, velocity {:?}",
            self.frames,
            grid.rotation,
            state.velocity
        );
    }
}

/// Orientation whose local +Z points along `direction`, with +Y kept upward
fn look_at(direction: Vec3) -> Option<Quat> {
    let z = direction.try_normalize()?;
    let x = Vec3::Y.cross(z).try_normalize()?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::Viewport;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::FRAC_PI_4;

    struct Rig {
        animator: FrameAnimator,
        state: InteractionState,
        scene: SceneBundle,
        rng: StdRng,
    }

    impl Rig {
        fn new(width: u32) -> Self {
            let config = SceneConfig::default();
            let mut rng = StdRng::seed_from_u64(11);
            let scene = SceneBundle::assemble(&config, Viewport::new(width, 800), &mut rng).unwrap();
            let layout = scene.layout(&config);
            Self {
                animator: FrameAnimator::new(&config.animation),
                state: InteractionState::new(&config.interaction, layout),
                scene,
                rng,
            }
        }

        fn run(&mut self, frames: usize) {
            for _ in 0..frames {
                self.animator.step(&mut self.state, &mut self.scene, &mut self.rng);
            }
        }

        fn cube(&self, matrix: usize, cube: usize) -> &crate::scene::CubeRecord {
            &self.scene.grid.matrix(MatrixId(matrix)).unwrap().cubes()[cube]
        }
    }

    #[test]
    fn test_at_rest_cubes_stay_at_rest() {
        let mut rig = Rig::new(1280);
        rig.run(30);
        let cube = rig.cube(0, 0);
        assert!((cube.position - cube.rest_position()).length() < 1e-4);
        assert!((cube.scale - Vec3::ONE).length() < 1e-4);
        assert_eq!(rig.animator.frames(), 30);
    }

    #[test]
    fn test_fast_rotation_explodes_outward() {
        let mut rig = Rig::new(1280);
        rig.state.dragging = true;
        rig.state.velocity = Vec2::new(0.0, 0.5);
        rig.run(200);

        // strength min(0.5 * 100, 100) = 50 along the explode direction
        let cube = rig.cube(0, 0);
        let expected = cube.rest_position() + cube.explode_direction() * 50.0;
        assert!((cube.position - expected).length() < 0.01);

        let center = rig.scene.grid.matrix(MatrixId(0)).unwrap().center_cube();
        assert!(center.position.length() < 1e-4);
    }

    #[test]
    fn test_slow_rotation_does_not_explode() {
        let mut rig = Rig::new(1280);
        rig.state.dragging = true;
        rig.state.velocity = Vec2::new(0.05, 0.0);
        rig.run(100);
        let cube = rig.cube(3, 0);
        assert!((cube.position - cube.rest_position()).length() < 1e-4);
    }

    #[test]
    fn test_hovered_matrix_pushes_cubes_apart() {
        let mut rig = Rig::new(1280);
        rig.state.hovered_matrix = Some(MatrixId(2));
        rig.run(200);

        let pushed = rig.cube(2, 0);
        let expected = pushed.rest_position() + pushed.explode_direction() * 3.0;
        assert!((pushed.position - expected).length() < 0.01);

        let other = rig.cube(1, 0);
        assert!((other.position - other.rest_position()).length() < 1e-4);
    }

    #[test]
    fn test_hovered_center_scales_up_and_faces_camera() {
        let mut rig = Rig::new(1280);
        rig.state.hovered_matrix = Some(MatrixId(4));
        rig.run(200);
        assert!(rig.state.hovered_center.is_none());

        let matrix = rig.scene.grid.matrix(MatrixId(4)).unwrap();
        let center = matrix.center_cube();
        assert!((center.scale - Vec3::splat(3.0)).length() < 1e-3);

        // local +Z of the cube, in world space, points at the camera
        let world = rig.scene.grid.center_cube_transform(matrix);
        let facing = world.transform_vector3(Vec3::Z).normalize();
        let to_camera = (rig.scene.camera.position - world.transform_point3(Vec3::ZERO)).normalize();
        assert!(facing.dot(to_camera) > 0.99, "facing {facing:?} vs {to_camera:?}");

        let other = rig.scene.grid.matrix(MatrixId(0)).unwrap().center_cube();
        assert!((other.scale - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn test_idle_drift_diverges_monotonically_then_stops() {
        let mut rig = Rig::new(1280);
        rig.state.idle = true;

        let mut last = vec![0.0_f32; rig.scene.grid.matrix(MatrixId(0)).unwrap().cubes().len()];
        for _ in 0..60 {
            rig.run(1);
            let cubes = rig.scene.grid.matrix(MatrixId(0)).unwrap().cubes();
            for (cube, previous) in cubes.iter().zip(last.iter_mut()) {
                let distance = cube.position.distance(cube.rest_position());
                assert!(distance >= *previous);
                *previous = distance;
                let v = cube.idle_velocity.unwrap();
                assert!(v.abs().max_element() <= 0.15);
            }
        }

        let fixed = rig.cube(0, 5).idle_velocity;
        rig.run(1);
        assert_eq!(rig.cube(0, 5).idle_velocity, fixed);

        rig.state.idle = false;
        rig.run(1);
        assert!(rig.cube(0, 5).idle_velocity.is_none());
    }

    #[test]
    fn test_inertia_decays_and_snaps_to_zero() {
        let mut rig = Rig::new(1280);
        rig.state.velocity = Vec2::new(0.0, 0.01);
        rig.run(1);
        assert!((rig.state.velocity.y - 0.0098).abs() < 1e-7);
        assert!(rig.scene.grid.rotation.y > 0.0);

        rig.run(2000);
        assert_eq!(rig.state.velocity, Vec2::ZERO);
        assert!(rig.scene.grid.rotation.y.abs() < 1e-4);
    }

    #[test]
    fn test_dragging_holds_rotation() {
        let mut rig = Rig::new(1280);
        rig.state.dragging = true;
        rig.scene.grid.rotation.x = 0.4;
        rig.run(10);
        assert_eq!(rig.scene.grid.rotation.x, 0.4);
    }

    #[test]
    fn test_layout_rotation_eases_toward_target() {
        let mut rig = Rig::new(1280);
        let config = SceneConfig::default();
        rig.scene.resize(Viewport::new(500, 800), &config).unwrap();
        rig.state.layout = Layout::Compact;

        rig.run(1);
        let z = rig.scene.grid.rotation.z;
        assert!(z > -FRAC_PI_4 && z < 0.0);

        rig.run(300);
        assert!(rig.scene.grid.rotation.z.abs() < 1e-4);
    }

    #[test]
    fn test_compact_layout_merges_and_shrinks() {
        let mut rig = Rig::new(400);
        rig.state.hovered_matrix = Some(MatrixId(0));
        rig.run(300);

        let cube = rig.cube(0, 0);
        assert!((cube.position - cube.rest_position() * 0.35).length() < 0.01);
        assert!((cube.scale - Vec3::splat(0.6)).length() < 1e-3);
    }

    #[test]
    fn test_outline_tracks_viewport() {
        let mut rig = Rig::new(1280);
        rig.run(1);
        let outline = rig.cube(0, 0).outline().unwrap();
        assert_eq!(outline.resolution, Vec2::new(1280.0, 800.0));
    }

    #[test]
    fn test_look_at_degenerate_direction() {
        assert!(look_at(Vec3::ZERO).is_none());
        assert!(look_at(Vec3::Y).is_none());
        let q = look_at(Vec3::Z).unwrap();
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }
}
