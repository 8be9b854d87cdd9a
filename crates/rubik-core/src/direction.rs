//! Direction Inference Engine
//!
//! ドラッグの開始点（掴んだ面）と移動量から、回転軸と回転方向を決定する。
//!
//! 1. 開始点の座標がしきい値を超えている軸から掴んだ面を決める
//!    （+X, +Y, +Z, -X, -Y, -Z の順に判定）
//! 2. 面に接する2軸の移動量のどちらかがドラッグしきい値を超えるまで保留
//! 3. 大きい方の軸（同値なら2番目の軸）と、その移動量の符号で
//!    `DRAG_TABLE` を引く

use glam::Vec3;

use crate::config::CubeConfig;
use crate::grid::{Axis, QuarterTurn, Sign};

// ============================================================================
// Face
// ============================================================================

/// キューブの外側の面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub axis: Axis,
    pub sign: Sign,
}

impl Face {
    /// 判定順（テーブルの行順でもある）
    pub const ALL: [Face; 6] = [
        Face::new(Axis::X, Sign::Positive),
        Face::new(Axis::Y, Sign::Positive),
        Face::new(Axis::Z, Sign::Positive),
        Face::new(Axis::X, Sign::Negative),
        Face::new(Axis::Y, Sign::Negative),
        Face::new(Axis::Z, Sign::Negative),
    ];

    pub const fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    /// 表面点から掴んだ面を判定
    /// どの軸もしきい値を超えていなければNone（面が曖昧）
    pub fn grabbed(point: Vec3, threshold: f32) -> Option<Face> {
        Self::ALL.into_iter().find(|face| {
            let value = face.axis.of(point);
            match face.sign {
                Sign::Positive => value > threshold,
                Sign::Negative => value < -threshold,
            }
        })
    }

    /// 面に接する2軸（優先順）
    pub fn tangents(self) -> [Axis; 2] {
        match self.axis {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }

    fn row(self) -> usize {
        match (self.axis, self.sign) {
            (Axis::X, Sign::Positive) => 0,
            (Axis::Y, Sign::Positive) => 1,
            (Axis::Z, Sign::Positive) => 2,
            (Axis::X, Sign::Negative) => 3,
            (Axis::Y, Sign::Negative) => 4,
            (Axis::Z, Sign::Negative) => 5,
        }
    }
}

// ============================================================================
// DRAG_TABLE
// ============================================================================

const fn turn(axis: Axis, sign: Sign) -> QuarterTurn {
    QuarterTurn { axis, sign }
}

use Axis::{X, Y, Z};
use Sign::{Negative as Neg, Positive as Pos};

/// (面, 支配的な接線軸) → 移動量が負のときの回転
/// 移動量が0以上のときは符号を反転する。
/// 列は `Face::tangents()` の順。
pub const DRAG_TABLE: [[QuarterTurn; 2]; 6] = [
    // +X: [y, z]
    [turn(Z, Pos), turn(Y, Neg)],
    // +Y: [x, z]
    [turn(Z, Neg), turn(X, Pos)],
    // +Z: [x, y]
    [turn(Y, Pos), turn(X, Neg)],
    // -X: [y, z]
    [turn(Z, Neg), turn(Y, Pos)],
    // -Y: [x, z]
    [turn(Z, Pos), turn(X, Neg)],
    // -Z: [x, y]
    [turn(Y, Neg), turn(X, Pos)],
];

// ============================================================================
// DirectionInference
// ============================================================================

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// まだ決められない（しきい値未満・面が曖昧・追跡喪失）
    Undecided,
    /// 回転が確定
    Resolved(QuarterTurn),
}

/// 方向推論エンジン
#[derive(Debug, Clone, Copy)]
pub struct DirectionInference {
    face_threshold: f32,
    drag_threshold: f32,
}

impl DirectionInference {
    pub fn new(face_threshold: f32, drag_threshold: f32) -> Self {
        Self {
            face_threshold,
            drag_threshold,
        }
    }

    pub fn from_config(config: &CubeConfig) -> Self {
        Self::new(config.face_threshold, config.drag_threshold)
    }

    /// 開始点から掴んだ面を判定
    pub fn grabbed_face(&self, start: Vec3) -> Option<Face> {
        Face::grabbed(start, self.face_threshold)
    }

    /// 開始点と現在点から回転を推論
    /// 現在点がない（ポインタがキューブ外）場合は保留
    pub fn resolve(&self, start: Vec3, current: Option<Vec3>) -> Decision {
        let (Some(face), Some(current)) = (self.grabbed_face(start), current) else {
            return Decision::Undecided;
        };
        self.resolve_on_face(face, start - current)
    }

    /// 掴んだ面と移動量（開始点 - 現在点）から回転を推論
    pub fn resolve_on_face(&self, face: Face, delta: Vec3) -> Decision {
        let [first, second] = face.tangents();
        let (d1, d2) = (first.of(delta), second.of(delta));

        if !(d1.abs() > self.drag_threshold || d2.abs() > self.drag_threshold) {
            return Decision::Undecided;
        }

        let (slot, d) = if d1.abs() > d2.abs() { (0, d1) } else { (1, d2) };
        let on_negative = DRAG_TABLE[face.row()][slot];
        let turn = match Sign::of(d) {
            Sign::Negative => on_negative,
            Sign::Positive => on_negative.inverse(),
        };

        log::trace!("drag on {:?}{:?}: delta {delta} -> {turn}", face.sign, face.axis);
        Decision::Resolved(turn)
    }
}
