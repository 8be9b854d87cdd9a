use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::picking::Ray;

/// GPU用カメラUniform
/// View-Projection行列とカメラ位置を格納
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// w成分は未使用（16バイトアライメント）
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, eye: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ZERO)
    }
}

/// カメラ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 初期位置（リセット時の戻り先）
    pub home: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// リセットアニメーションの長さ
    pub reset_duration_ms: f32,
    /// 1ピクセルあたりの回転量（ラジアン）
    pub orbit_speed: f32,
    /// ホイール1単位あたりの距離倍率
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            home: Vec3::splat(5.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            reset_duration_ms: 2000.0,
            orbit_speed: 0.01,
            zoom_speed: 0.001,
            min_distance: 3.0,
            max_distance: 50.0,
        }
    }
}

/// 極付近で反転しないための余白
const POLE_MARGIN: f32 = 0.01;

/// 3Dカメラ
/// 注視点の周りを回る透視投影カメラ
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// デフォルト設定で新しいカメラを作成
    pub fn new(aspect: f32) -> Self {
        Self::from_config(&CameraConfig::default(), aspect)
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: config.home,
            target: config.target,
            up: Vec3::Y,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// View-Projection行列を構築
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, self.up);
        let proj = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        proj * view
    }

    /// GPU用のCameraUniformを取得
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::new(self.build_view_projection_matrix(), self.position)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// 注視点からの距離
    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// 注視点を中心に回転（ヨーはワールドY軸、ピッチは極で止める）
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let azimuth = offset.x.atan2(offset.z) + yaw;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() - pitch)
            .clamp(POLE_MARGIN, std::f32::consts::PI - POLE_MARGIN);

        let offset = Vec3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );
        self.position = self.target + offset;
    }

    /// 距離を倍率で変更（範囲内にクランプ）
    pub fn zoom(&mut self, factor: f32, min_distance: f32, max_distance: f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON || !(factor > 0.0) {
            return;
        }
        let next = (distance * factor).clamp(min_distance, max_distance);
        self.position = self.target + offset * (next / distance);
    }

    /// NDC座標（-1..1、上が+Y）からワールド空間のレイを作成
    pub fn screen_to_ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.build_view_projection_matrix().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

// ============================================================================
// ViewReset
// ============================================================================

/// カメラ位置を一定時間で線形に戻すアニメーション
#[derive(Debug, Clone)]
pub struct ViewReset {
    from: Vec3,
    to: Vec3,
    duration_ms: f32,
    elapsed_ms: f32,
}

impl ViewReset {
    pub fn new(from: Vec3, to: Vec3, duration_ms: f32) -> Self {
        Self {
            from,
            to,
            duration_ms,
            elapsed_ms: 0.0,
        }
    }

    /// 時間を進めて位置を返す。終了時は目標位置ちょうど
    pub fn advance(&mut self, delta_ms: f32) -> Vec3 {
        if delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, self.elapsed_ms / self.duration_ms)
    }

    pub fn is_finished(&self) -> bool {
        !(self.elapsed_ms < self.duration_ms)
    }
}
