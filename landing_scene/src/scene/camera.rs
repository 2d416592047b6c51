// scene/camera.rs - Perspective camera, viewport and picking rays

use glam::{Affine3A, Mat4, Vec2, Vec3};

/// Window size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Client coordinates to normalized device coordinates (y up)
    pub fn to_ndc(&self, client: Vec2) -> Vec2 {
        let size = self.size().max(Vec2::ONE);
        Vec2::new(
            (client.x / size.x) * 2.0 - 1.0,
            -(client.y / size.y) * 2.0 + 1.0,
        )
    }
}

/// Camera looking down -Z from `position`, matching the page's default camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World-space ray through a point given in normalized device coordinates
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let half_height = (self.fov_deg.to_radians() / 2.0).tan();
        let direction = Vec3::new(ndc.x * half_height * self.aspect, ndc.y * half_height, -1.0);
        Ray {
            origin: self.position,
            direction: direction.normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    /// Distance to the nearest intersection in front of the origin
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Hit test against an oriented cube of edge `size` placed by `transform`.
    /// Returns the distance along the world ray.
    pub fn intersect_cube(&self, transform: &Affine3A, size: f32) -> Option<f32> {
        if transform.matrix3.determinant().abs() < 1e-12 {
            return None;
        }
        let inverse = transform.inverse();
        let local_origin = inverse.transform_point3(self.origin);
        let local_dir = inverse.transform_vector3(self.direction);

        let half = size / 2.0;
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let o = local_origin[axis];
            let d = local_dir[axis];
            if d.abs() < 1e-9 {
                if o < -half || o > half {
                    return None;
                }
                continue;
            }
            let t1 = (-half - o) / d;
            let t2 = (half - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        let t_local = if t_min >= 0.0 { t_min } else { t_max };
        let hit = transform.transform_point3(local_origin + local_dir * t_local);
        Some(hit.distance(self.origin))
    }
}
