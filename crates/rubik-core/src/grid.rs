//! グリッド基本型
//!
//! 軸・符号・90度回転・向き（24通りの回転）を整数演算で表現する。
//! 浮動小数点は描画用の変換でのみ使う。

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::ops::Neg;

use glam::{IVec3, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Axis
// ============================================================================

/// ワールド座標軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// 全軸（X, Y, Zの順）
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// インデックス（X = 0, Y = 1, Z = 2）
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// 単位ベクトル
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// ベクトルのこの軸成分
    #[inline]
    pub fn of(self, v: Vec3) -> f32 {
        v[self.index()]
    }

    /// 整数ベクトルのこの軸成分
    #[inline]
    pub fn of_grid(self, v: IVec3) -> i32 {
        v[self.index()]
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

// ============================================================================
// Sign
// ============================================================================

/// 正負
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// 値の符号（0は正として扱う）
    #[inline]
    pub fn of(value: f32) -> Sign {
        if value < 0.0 { Sign::Negative } else { Sign::Positive }
    }

    /// -1 / 1
    #[inline]
    pub fn int(self) -> i32 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }

    /// -1.0 / 1.0
    #[inline]
    pub fn float(self) -> f32 {
        self.int() as f32
    }
}

impl Neg for Sign {
    type Output = Sign;

    fn neg(self) -> Sign {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

// ============================================================================
// QuarterTurn
// ============================================================================

/// ワールド軸まわりの90度回転（右手系。正は軸の正方向から見て反時計回り）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterTurn {
    pub axis: Axis,
    pub sign: Sign,
}

impl QuarterTurn {
    pub fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    /// 逆回転
    pub fn inverse(self) -> Self {
        Self {
            axis: self.axis,
            sign: -self.sign,
        }
    }

    /// 整数グリッド座標を回転（誤差なし）
    pub fn apply(self, v: IVec3) -> IVec3 {
        let IVec3 { x, y, z } = v;
        match (self.axis, self.sign) {
            (Axis::X, Sign::Positive) => IVec3::new(x, -z, y),
            (Axis::X, Sign::Negative) => IVec3::new(x, z, -y),
            (Axis::Y, Sign::Positive) => IVec3::new(z, y, -x),
            (Axis::Y, Sign::Negative) => IVec3::new(-z, y, x),
            (Axis::Z, Sign::Positive) => IVec3::new(-y, x, z),
            (Axis::Z, Sign::Negative) => IVec3::new(y, -x, z),
        }
    }

    /// 途中角度（度）の回転クォータニオン
    pub fn partial_quat(self, degrees: f32) -> Quat {
        Quat::from_axis_angle(self.axis.unit(), self.sign.float() * degrees.to_radians())
    }

    /// 90度回転のクォータニオン
    pub fn quat(self) -> Quat {
        Quat::from_axis_angle(self.axis.unit(), self.sign.float() * FRAC_PI_2)
    }
}

impl fmt::Display for QuarterTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Sign::Positive => write!(f, "{}", self.axis),
            Sign::Negative => write!(f, "-{}", self.axis),
        }
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// Cubeletの向き
/// 各列は単位軸X/Y/Zの回転後の像（符号付き置換行列、行列式+1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation {
    cols: [IVec3; 3],
}

impl Orientation {
    /// 回転なし
    pub const IDENTITY: Self = Self {
        cols: [IVec3::X, IVec3::Y, IVec3::Z],
    };

    /// 列ベクトル
    pub fn cols(&self) -> [IVec3; 3] {
        self.cols
    }

    /// 向きをベクトルに適用
    pub fn apply(&self, v: IVec3) -> IVec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }

    /// この向きの後にワールド軸回転を合成
    pub fn then(self, turn: QuarterTurn) -> Self {
        Self {
            cols: self.cols.map(|c| turn.apply(c)),
        }
    }

    /// 行列式
    pub fn determinant(&self) -> i32 {
        let [a, b, c] = self.cols;
        let cross = IVec3::new(
            b.y * c.z - b.z * c.y,
            b.z * c.x - b.x * c.z,
            b.x * c.y - b.y * c.x,
        );
        a.dot(cross)
    }

    /// 立方体の24通りの回転のいずれかか
    pub fn is_proper_rotation(&self) -> bool {
        let unit = |c: IVec3| c.abs().element_sum() == 1 && c.abs().max_element() == 1;
        self.cols.iter().all(|&c| unit(c))
            && self.cols[0].dot(self.cols[1]) == 0
            && self.cols[1].dot(self.cols[2]) == 0
            && self.cols[0].dot(self.cols[2]) == 0
            && self.determinant() == 1
    }

    /// 描画用クォータニオン
    pub fn to_quat(&self) -> Quat {
        let [a, b, c] = self.cols;
        Quat::from_mat3(&Mat3::from_cols(a.as_vec3(), b.as_vec3(), c.as_vec3())).normalize()
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn all_turns() -> Vec<QuarterTurn> {
        Axis::ALL
            .into_iter()
            .flat_map(|axis| [Sign::Positive, Sign::Negative].map(|sign| QuarterTurn::new(axis, sign)))
            .collect()
    }

    #[test]
    fn test_sign_of() {
        assert_eq!(Sign::of(-0.1), Sign::Negative);
        assert_eq!(Sign::of(0.0), Sign::Positive);
        assert_eq!(Sign::of(2.0), Sign::Positive);
        assert_eq!(-Sign::Positive, Sign::Negative);
    }

    #[test]
    fn test_turn_matches_float_rotation() {
        let v = IVec3::new(1, -1, 0);
        for turn in all_turns() {
            let exact = turn.apply(v).as_vec3();
            let float = turn.quat() * v.as_vec3();
            assert_abs_diff_eq!(exact.x, float.x, epsilon = 1e-5);
            assert_abs_diff_eq!(exact.y, float.y, epsilon = 1e-5);
            assert_abs_diff_eq!(exact.z, float.z, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_positive_y_turn() {
        // +90度 (Y): X軸は -Z へ
        let turn = QuarterTurn::new(Axis::Y, Sign::Positive);
        assert_eq!(turn.apply(IVec3::X), IVec3::NEG_Z);
        assert_eq!(turn.apply(IVec3::Z), IVec3::X);
    }

    #[test]
    fn test_inverse_restores() {
        let v = IVec3::new(1, 0, -1);
        for turn in all_turns() {
            assert_eq!(turn.inverse().apply(turn.apply(v)), v);
        }
    }

    #[test]
    fn test_four_turns_identity() {
        for turn in all_turns() {
            let mut o = Orientation::IDENTITY;
            for _ in 0..4 {
                o = o.then(turn);
            }
            assert_eq!(o, Orientation::IDENTITY);
        }
    }

    #[test]
    fn test_orientation_group_has_24_elements() {
        let mut seen = HashSet::new();
        let mut frontier = vec![Orientation::IDENTITY];
        while let Some(o) = frontier.pop() {
            if !seen.insert(o) {
                continue;
            }
            assert!(o.is_proper_rotation());
            for turn in all_turns() {
                frontier.push(o.then(turn));
            }
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_orientation_quat_matches_columns() {
        let o = Orientation::IDENTITY
            .then(QuarterTurn::new(Axis::X, Sign::Positive))
            .then(QuarterTurn::new(Axis::Z, Sign::Negative));
        let q = o.to_quat();
        for (axis, col) in Axis::ALL.into_iter().zip(o.cols()) {
            let rotated = q * axis.unit();
            assert_abs_diff_eq!(rotated.x, col.x as f32, epsilon = 1e-5);
            assert_abs_diff_eq!(rotated.y, col.y as f32, epsilon = 1e-5);
            assert_abs_diff_eq!(rotated.z, col.z as f32, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(QuarterTurn::new(Axis::Y, Sign::Negative).to_string(), "-y");
        assert_eq!(QuarterTurn::new(Axis::Z, Sign::Positive).to_string(), "z");
    }
}
