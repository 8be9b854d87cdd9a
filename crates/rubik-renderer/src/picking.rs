//! Picking system for ray-box intersection
//!
//! Provides CPU-based cubelet picking using raycasting.
//! Each cubelet is tested in its own local frame, so cubelets that are
//! mid-rotation are picked where they are drawn.

use glam::{Mat4, Vec2, Vec3};
use rubik_core::{CubeletId, HitTest, SurfaceHit, Transform};

use crate::camera::Camera;

/// Ray for raycasting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (should be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point along the ray at distance `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine matrix without renormalizing,
    /// so distances stay comparable under rigid transforms
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Check intersection with AABB using slab method
    /// Returns the distance to intersection point if hit, None otherwise
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        // Handle division by zero with small epsilon
        let inv_dir = Vec3::new(
            if self.direction.x.abs() > f32::EPSILON {
                1.0 / self.direction.x
            } else {
                f32::MAX
            },
            if self.direction.y.abs() > f32::EPSILON {
                1.0 / self.direction.y
            } else {
                f32::MAX
            },
            if self.direction.z.abs() > f32::EPSILON {
                1.0 / self.direction.z
            } else {
                f32::MAX
            },
        );

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let tmin_vec = t1.min(t2);
        let tmax_vec = t1.max(t2);

        let tmin = tmin_vec.x.max(tmin_vec.y).max(tmin_vec.z);
        let tmax = tmax_vec.x.min(tmax_vec.y).min(tmax_vec.z);

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy)]
pub struct AABB {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a unit cube centered at position with given scale
    pub fn unit_cube(center: Vec3, scale: Vec3) -> Self {
        let half = scale * 0.5;
        Self::new(center - half, center + half)
    }
}

/// Canvas-pixel picker over the cubelets' current world transforms
#[derive(Debug, Clone)]
pub struct RayPicker {
    camera: Camera,
    viewport: Vec2,
    bounds: AABB,
    /// (cubelet, world-to-local)
    targets: Vec<(CubeletId, Mat4)>,
}

impl RayPicker {
    pub fn new(
        camera: &Camera,
        viewport: Vec2,
        cubelet_size: f32,
        transforms: &[(CubeletId, Transform)],
    ) -> Self {
        Self {
            camera: camera.clone(),
            viewport,
            bounds: AABB::unit_cube(Vec3::ZERO, Vec3::splat(cubelet_size)),
            targets: transforms
                .iter()
                .map(|(id, transform)| (*id, transform.to_matrix().inverse()))
                .collect(),
        }
    }

    /// Canvas pixels (origin top-left) to NDC (origin center, +Y up)
    pub fn to_ndc(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        Vec2::new(
            screen_x / self.viewport.x * 2.0 - 1.0,
            1.0 - screen_y / self.viewport.y * 2.0,
        )
    }

    /// Nearest cubelet hit along a world-space ray
    pub fn cast(&self, ray: &Ray) -> Option<SurfaceHit> {
        self.targets
            .iter()
            .filter_map(|(id, to_local)| {
                ray.transformed(to_local)
                    .intersect_aabb(&self.bounds)
                    .map(|t| (*id, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, t)| SurfaceHit::new(id, ray.at(t)))
    }
}

impl HitTest for RayPicker {
    fn pick(&self, screen_x: f32, screen_y: f32) -> Option<SurfaceHit> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ray = self.camera.screen_to_ray(self.to_ndc(screen_x, screen_y));
        self.cast(&ray)
    }
}
