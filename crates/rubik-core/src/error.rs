//! エラー型
//!
//! コア内部の不変条件違反を表す。ユーザー入力起因の異常はここに現れず、
//! InteractionEngine 側で「何も起きない」に縮退させる。

use glam::IVec3;
use thiserror::Error;

use crate::grid::Axis;
use crate::registry::CubeletId;

/// 設定値の検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSONとして解釈できない
    #[error("failed to parse cube config: {0}")]
    Parse(#[from] serde_json::Error),

    /// 正の有限値であるべきフィールドが不正
    #[error("config field `{field}` must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// スライス判定の許容誤差がグリッド間隔の半分以上
    #[error("slice_epsilon ({epsilon}) must be smaller than half the grid gap ({gap})")]
    EpsilonTooLarge { epsilon: f32, gap: f32 },

    /// 1ステップの角度が90度を超えている
    #[error("step_degrees ({0}) must not exceed 90")]
    StepTooLarge(f32),

    /// 1ステップの角度が小さすぎて回転が終わらない
    #[error("step_degrees ({step}) must be at least {min}")]
    StepTooSmall { step: f32, min: f32 },

    /// 面判定のしきい値が外側レイヤーの厚みの範囲外
    #[error("face_threshold ({threshold}) must lie strictly between {inner} and {outer}")]
    FaceThresholdOutOfRange { threshold: f32, inner: f32, outer: f32 },
}

/// Cubelet Registry の操作エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// レイヤー値が {-1, 0, 1} の範囲外
    #[error("layer {0} is outside the 3x3x3 grid")]
    InvalidLayer(i32),

    /// 同一グループ内で重複したCubelet
    #[error("cubelet {0} appears twice in the rotation group")]
    DuplicateCubelet(CubeletId),

    /// 回転後の座標がグリッド外（内部状態が壊れている）
    #[error("cubelet {id} left the grid at {coord}")]
    OffGrid { id: CubeletId, coord: IVec3 },

    /// 回転後の座標がグループ外のCubeletと重なる
    #[error("cubelet {id} would collide with a non-member at {coord}")]
    Collision { id: CubeletId, coord: IVec3 },
}

/// Slice Rotation Controller のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotationError {
    /// 既に回転中
    #[error("a slice rotation is already in flight")]
    Busy,

    /// スライスが9個にならなかった
    #[error("slice {axis:?}={layer} holds {found} cubelets, expected 9")]
    SliceSize { axis: Axis, layer: i32, found: usize },

    /// Registry 側のエラー
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
