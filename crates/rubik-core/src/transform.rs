use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// 3D Transform
/// Represents position, rotation and scale in world space
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Create an identity transform (no translation, rotation, or scale)
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a transform with position and rotation (unit scale)
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Apply a pivot rotation about the world origin.
    /// Equivalent to parenting under a pivot node and reading back the world transform.
    pub fn rotated_about_origin(&self, pivot: Quat) -> Self {
        Self {
            position: pivot * self.position,
            rotation: pivot * self.rotation,
            scale: self.scale,
        }
    }

    /// Convert to a 4x4 transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// GPU用モデル行列Uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

impl ModelUniform {
    /// Transformから作成
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().to_cols_array_2d(),
        }
    }
}
