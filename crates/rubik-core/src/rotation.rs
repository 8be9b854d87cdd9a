//! Slice Rotation Controller
//!
//! 推論された回転を9個のCubeletのアニメーションとして実行し、
//! 完了時にRegistryへ確定させる。
//!
//! 状態遷移: `Idle -> Grouped -> Animating -> (Committed) -> Idle`
//!
//! シーングラフの付け替えは行わず、メンバーのインデックス集合と
//! ピボット回転だけを持つ。描画時に `pivot * 静止Transform` を合成する。

use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::config::CubeConfig;
use crate::error::RotationError;
use crate::grid::QuarterTurn;
use crate::registry::{CubeletId, CubeletRegistry, SLICE_SIZE};
use crate::transform::Transform;

/// 1回の回転の角度（度）
pub const QUARTER_DEGREES: f32 = 90.0;

/// スライス回転（どの軸の、どのレイヤーを、どちらに回すか）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceTurn {
    #[serde(flatten)]
    pub turn: QuarterTurn,
    /// 回転軸方向のグリッド座標（-1, 0, 1）
    pub layer: i32,
}

impl SliceTurn {
    pub fn new(turn: QuarterTurn, layer: i32) -> Self {
        Self { turn, layer }
    }
}

// ============================================================================
// AnimationClock
// ============================================================================

/// 固定間隔ティックの時計
/// ホストのフレーム時間（ミリ秒）を整数個のティックに変換し、端数は持ち越す
#[derive(Debug, Clone)]
pub struct AnimationClock {
    interval_ms: f32,
    pending_ms: f32,
}

impl AnimationClock {
    pub fn new(interval_ms: f32) -> Self {
        Self {
            interval_ms,
            pending_ms: 0.0,
        }
    }

    /// 時間を進め、経過したティック数を返す
    pub fn advance(&mut self, delta_ms: f32) -> u32 {
        // 負値・NaNは無視
        if !(delta_ms > 0.0) {
            return 0;
        }
        self.pending_ms += delta_ms;
        let ticks = (self.pending_ms / self.interval_ms).floor();
        self.pending_ms -= ticks * self.interval_ms;
        ticks as u32
    }
}

// ============================================================================
// RotationUnit
// ============================================================================

/// 回転中の一時的なグループ（9個のCubelet + ピボット角度）
#[derive(Debug, Clone)]
pub struct RotationUnit {
    slice: SliceTurn,
    members: Vec<CubeletId>,
    angle: f32,
    step_degrees: f32,
    clock: AnimationClock,
}

/// `RotationUnit::advance` の結果
#[derive(Debug, Clone)]
pub enum Advance {
    /// まだ回転中
    Animating(RotationUnit),
    /// 90度に到達（角度はちょうど90度にスナップ済み）
    Committed(RotationUnit),
}

impl RotationUnit {
    pub fn new(slice: SliceTurn, members: Vec<CubeletId>, config: &CubeConfig) -> Self {
        Self {
            slice,
            members,
            angle: 0.0,
            step_degrees: config.step_degrees,
            clock: AnimationClock::new(config.tick_interval_ms),
        }
    }

    pub fn slice(&self) -> SliceTurn {
        self.slice
    }

    pub fn members(&self) -> &[CubeletId] {
        &self.members
    }

    pub fn contains(&self, id: CubeletId) -> bool {
        self.members.contains(&id)
    }

    /// 現在の回転角度（度、符号なし）
    pub fn angle_degrees(&self) -> f32 {
        self.angle
    }

    /// ピボットの回転
    pub fn pivot(&self) -> Quat {
        self.slice.turn.partial_quat(self.angle)
    }

    /// 時間を進める（純粋な状態更新）
    pub fn advance(mut self, delta_ms: f32) -> Advance {
        let ticks = self.clock.advance(delta_ms);
        for _ in 0..ticks {
            self.angle += self.step_degrees;
            if self.angle >= QUARTER_DEGREES {
                // 最終ティックで累積誤差を除去
                self.angle = QUARTER_DEGREES;
                return Advance::Committed(self);
            }
        }
        Advance::Animating(self)
    }
}

// ============================================================================
// SliceRotationController
// ============================================================================

#[derive(Debug, Clone, Default)]
enum ControllerState {
    #[default]
    Idle,
    Grouped(RotationUnit),
    Animating(RotationUnit),
}

/// スライス回転コントローラー
#[derive(Debug, Clone)]
pub struct SliceRotationController {
    config: CubeConfig,
    state: ControllerState,
}

impl SliceRotationController {
    pub fn new(config: &CubeConfig) -> Self {
        Self {
            config: config.clone(),
            state: ControllerState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ControllerState::Idle)
    }

    /// 実行中の回転ユニット
    pub fn unit(&self) -> Option<&RotationUnit> {
        match &self.state {
            ControllerState::Idle => None,
            ControllerState::Grouped(unit) | ControllerState::Animating(unit) => Some(unit),
        }
    }

    /// スライスをグループ化して回転を開始
    pub fn begin(
        &mut self,
        registry: &CubeletRegistry,
        slice: SliceTurn,
    ) -> Result<(), RotationError> {
        if !self.is_idle() {
            return Err(RotationError::Busy);
        }

        let axis = slice.turn.axis;
        let members: Vec<CubeletId> = registry
            .slice_along(axis, slice.layer)?
            .iter()
            .map(|c| c.id())
            .collect();

        if members.len() != SLICE_SIZE {
            return Err(RotationError::SliceSize {
                axis,
                layer: slice.layer,
                found: members.len(),
            });
        }

        log::debug!("grouped slice {axis}={} for turn {}", slice.layer, slice.turn);
        self.state = ControllerState::Grouped(RotationUnit::new(slice, members, &self.config));
        Ok(())
    }

    /// アニメーションを進める
    /// 完了した場合はRegistryに確定させ、確定した回転を返す
    pub fn tick(
        &mut self,
        registry: &mut CubeletRegistry,
        delta_ms: f32,
    ) -> Result<Option<SliceTurn>, RotationError> {
        let unit = match std::mem::take(&mut self.state) {
            ControllerState::Idle => return Ok(None),
            ControllerState::Grouped(unit) | ControllerState::Animating(unit) => unit,
        };

        match unit.advance(delta_ms) {
            Advance::Animating(unit) => {
                self.state = ControllerState::Animating(unit);
                Ok(None)
            }
            Advance::Committed(unit) => {
                // 失敗してもユニットは破棄してIdleに戻る（Registryは変更されない）
                registry.commit_rotation(unit.members(), unit.slice().turn)?;
                log::debug!("committed turn {} on layer {}", unit.slice().turn, unit.slice().layer);
                Ok(Some(unit.slice()))
            }
        }
    }

    /// 全CubeletのワールドTransform（回転中のメンバーはピボットを合成）
    pub fn world_transforms(&self, registry: &CubeletRegistry) -> Vec<(CubeletId, Transform)> {
        let unit = self.unit();
        registry
            .rest_transforms()
            .map(|(id, rest)| match unit {
                Some(unit) if unit.contains(id) => (id, rest.rotated_about_origin(unit.pivot())),
                _ => (id, rest),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use glam::IVec3;

    use super::*;
    use crate::grid::{Axis, Sign};

    fn setup() -> (CubeConfig, CubeletRegistry, SliceRotationController) {
        let config = CubeConfig::default();
        let registry = CubeletRegistry::new(&config);
        let controller = SliceRotationController::new(&config);
        (config, registry, controller)
    }

    fn y_down_top() -> SliceTurn {
        SliceTurn::new(QuarterTurn::new(Axis::Y, Sign::Negative), 1)
    }

    #[test]
    fn test_clock_whole_ticks_and_remainder() {
        let mut clock = AnimationClock::new(10.0);
        assert_eq!(clock.advance(25.0), 2);
        // 持ち越した5msと合わせて1ティック
        assert_eq!(clock.advance(5.0), 1);
        assert_eq!(clock.advance(9.0), 0);
        assert_eq!(clock.advance(-3.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(1.0), 1);
    }

    #[test]
    fn test_unit_takes_thirty_ticks() {
        let config = CubeConfig::default();
        let mut unit = RotationUnit::new(y_down_top(), Vec::new(), &config);
        for i in 1..30 {
            unit = match unit.advance(10.0) {
                Advance::Animating(unit) => unit,
                Advance::Committed(_) => panic!("committed early at tick {i}"),
            };
            assert_abs_diff_eq!(unit.angle_degrees(), i as f32 * 3.0, epsilon = 1e-3);
        }
        match unit.advance(10.0) {
            Advance::Committed(unit) => assert_eq!(unit.angle_degrees(), QUARTER_DEGREES),
            Advance::Animating(_) => panic!("expected commit on tick 30"),
        }
    }

    #[test]
    fn test_unit_snaps_when_step_overshoots() {
        let config = CubeConfig {
            step_degrees: 7.0,
            ..Default::default()
        };
        let unit = RotationUnit::new(y_down_top(), Vec::new(), &config);
        // 13 * 7 = 91 → 90にスナップ
        match unit.advance(130.0) {
            Advance::Committed(unit) => assert_eq!(unit.angle_degrees(), QUARTER_DEGREES),
            Advance::Animating(_) => panic!("expected commit"),
        }
    }

    #[test]
    fn test_begin_groups_nine() {
        let (_, registry, mut controller) = setup();
        controller.begin(&registry, y_down_top()).unwrap();

        assert!(!controller.is_idle());
        let unit = controller.unit().unwrap();
        assert_eq!(unit.members().len(), SLICE_SIZE);
        assert!(unit
            .members()
            .iter()
            .all(|&id| registry.get(id).unwrap().coord().y == 1));
    }

    #[test]
    fn test_begin_while_busy() {
        let (_, registry, mut controller) = setup();
        controller.begin(&registry, y_down_top()).unwrap();
        assert_eq!(
            controller.begin(&registry, y_down_top()),
            Err(RotationError::Busy)
        );
    }

    #[test]
    fn test_begin_invalid_layer() {
        let (_, registry, mut controller) = setup();
        let slice = SliceTurn::new(QuarterTurn::new(Axis::X, Sign::Positive), 3);
        assert!(matches!(
            controller.begin(&registry, slice),
            Err(RotationError::Registry(_))
        ));
        assert!(controller.is_idle());
    }

    #[test]
    fn test_grouping_does_not_move_cubelets() {
        let (_, registry, mut controller) = setup();
        let before = controller.world_transforms(&registry);
        controller.begin(&registry, y_down_top()).unwrap();
        assert_eq!(controller.world_transforms(&registry), before);
    }

    #[test]
    fn test_full_rotation_commits() {
        let (_, mut registry, mut controller) = setup();
        let corner = registry.cubelet_at(IVec3::new(1, 1, 1)).unwrap().id();
        controller.begin(&registry, y_down_top()).unwrap();

        let mut committed = None;
        for _ in 0..40 {
            if let Some(slice) = controller.tick(&mut registry, 10.0).unwrap() {
                committed = Some(slice);
                break;
            }
            assert!(!controller.is_idle());
        }

        assert_eq!(committed, Some(y_down_top()));
        assert!(controller.is_idle());
        // -90度 (Y): (x, y, z) → (-z, y, x)
        assert_eq!(registry.get(corner).unwrap().coord(), IVec3::new(-1, 1, 1));
        assert!(registry.is_canonical());
    }

    #[test]
    fn test_world_transform_continuous_at_commit() {
        let (_, mut registry, mut controller) = setup();
        controller.begin(&registry, y_down_top()).unwrap();
        // 29ティック分進める
        controller.tick(&mut registry, 290.0).unwrap();
        let unit = controller.unit().unwrap().clone();

        // 90度ちょうどのピボット適用結果 == 確定後の静止Transform
        let at_ninety: Vec<(CubeletId, Transform)> = registry
            .rest_transforms()
            .map(|(id, rest)| {
                if unit.contains(id) {
                    (id, rest.rotated_about_origin(unit.slice().turn.quat()))
                } else {
                    (id, rest)
                }
            })
            .collect();

        controller.tick(&mut registry, 10.0).unwrap();
        let after = controller.world_transforms(&registry);

        for ((_, a), (_, b)) in at_ninety.iter().zip(after.iter()) {
            assert_abs_diff_eq!(a.position.x, b.position.x, epsilon = 1e-4);
            assert_abs_diff_eq!(a.position.y, b.position.y, epsilon = 1e-4);
            assert_abs_diff_eq!(a.position.z, b.position.z, epsilon = 1e-4);
            assert!(a.rotation.abs_diff_eq(b.rotation, 1e-4) || a.rotation.abs_diff_eq(-b.rotation, 1e-4));
        }
    }

    #[test]
    fn test_tick_when_idle() {
        let (_, mut registry, mut controller) = setup();
        assert_eq!(controller.tick(&mut registry, 1000.0), Ok(None));
    }

    #[test]
    fn test_slice_turn_serialize() {
        let json = serde_json::to_string(&y_down_top()).unwrap();
        assert_eq!(json, r#"{"axis":"y","sign":"negative","layer":1}"#);
    }
}
