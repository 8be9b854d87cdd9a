//! 点光源
//!
//! 各軸の ±3 に白色の点光源を置く（計6個）。

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// 点光源の数
pub const LIGHT_COUNT: usize = 6;

/// GPU用ライトUniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightUniform {
    /// xyz: 位置、w: 未使用
    pub positions: [[f32; 4]; LIGHT_COUNT],
    /// rgb: 色、a: 強さ
    pub color: [f32; 4],
}

impl LightUniform {
    /// 原点から `distance` 離れた6方向に同じ光源を置く
    pub fn axis_rig(distance: f32, color: Vec3, intensity: f32) -> Self {
        let directions = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        Self {
            positions: directions.map(|d| (d * distance).extend(1.0).to_array()),
            color: color.extend(intensity).to_array(),
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::axis_rig(3.0, Vec3::ONE, 0.9)
    }
}
