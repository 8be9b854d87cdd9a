//! Interaction State Machine
//!
//! ポインタイベントを受け取り、ジェスチャーの追跡・方向推論・スライス回転の
//! 開始を仲介する。ホストはこの構造体1つを保持し、イベントとフレームを流す。
//!
//! ```text
//! Ready --down(hit)--> GestureStarted --move--> DirectionPending
//!   ^                        |                      |
//!   |                        +------ resolved ------+--> Rotating
//!   +------------ up / cancel / commit -----------------------+
//! ```

use glam::Vec3;

use crate::config::CubeConfig;
use crate::direction::{Decision, DirectionInference, Face};
use crate::error::ConfigError;
use crate::hit_test::{HitTest, SurfaceHit};
use crate::registry::{CubeletId, CubeletRegistry};
use crate::rotation::{SliceRotationController, SliceTurn};
use crate::transform::Transform;

/// 進行中のドラッグ
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    /// 押下時のヒット
    pub start: SurfaceHit,
    /// 掴んだ面（判定できなければNone）
    pub face: Option<Face>,
    /// 最新のポインタ位置の表面点（キューブ外ならNone）
    pub current: Option<Vec3>,
}

impl Gesture {
    fn new(start: SurfaceHit, face: Option<Face>) -> Self {
        Self {
            start,
            face,
            current: None,
        }
    }
}

/// 対話の状態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Ready,
    GestureStarted(Gesture),
    DirectionPending(Gesture),
    Rotating(SliceTurn),
}

/// ポインタイベントの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResponse {
    /// 何も起きなかった
    Ignored,
    /// ジェスチャーを開始した
    GestureStarted,
    /// 方向がまだ決まらない
    Pending,
    /// 回転を開始した
    RotationStarted(SliceTurn),
    /// ジェスチャーを破棄した
    GestureDiscarded,
}

impl PointerResponse {
    /// イベントがキューブに消費されたか（ホスト側のカメラ操作を抑止する目安）
    pub fn is_handled(self) -> bool {
        !matches!(self, PointerResponse::Ignored)
    }
}

/// 対話エンジン
#[derive(Debug, Clone)]
pub struct InteractionEngine {
    config: CubeConfig,
    registry: CubeletRegistry,
    inference: DirectionInference,
    controller: SliceRotationController,
    phase: Phase,
}

impl InteractionEngine {
    pub fn new(config: CubeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry: CubeletRegistry::new(&config),
            inference: DirectionInference::from_config(&config),
            controller: SliceRotationController::new(&config),
            phase: Phase::Ready,
            config,
        })
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn registry(&self) -> &CubeletRegistry {
        &self.registry
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.phase, Phase::Rotating(_))
    }

    /// カメラ操作を許可するか（Readyのときのみ）
    pub fn orbit_enabled(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }

    /// ポインタ押下
    pub fn pointer_down<H: HitTest + ?Sized>(
        &mut self,
        picker: &H,
        screen_x: f32,
        screen_y: f32,
    ) -> PointerResponse {
        if !matches!(self.phase, Phase::Ready) {
            return PointerResponse::Ignored;
        }
        let Some(hit) = picker.pick(screen_x, screen_y) else {
            return PointerResponse::Ignored;
        };
        if self.registry.get(hit.cubelet).is_none() {
            log::warn!("pick returned unknown cubelet {}", hit.cubelet);
            return PointerResponse::Ignored;
        }

        let face = self.inference.grabbed_face(hit.point);
        log::debug!("gesture started on cubelet {} face {face:?}", hit.cubelet);
        self.phase = Phase::GestureStarted(Gesture::new(hit, face));
        PointerResponse::GestureStarted
    }

    /// ポインタ移動
    pub fn pointer_move<H: HitTest + ?Sized>(
        &mut self,
        picker: &H,
        screen_x: f32,
        screen_y: f32,
    ) -> PointerResponse {
        let mut gesture = match std::mem::take(&mut self.phase) {
            Phase::GestureStarted(gesture) | Phase::DirectionPending(gesture) => gesture,
            other => {
                self.phase = other;
                return PointerResponse::Ignored;
            }
        };

        gesture.current = picker.pick(screen_x, screen_y).map(|hit| hit.point);
        let decision = match gesture.face {
            Some(face) => match gesture.current {
                Some(current) => self.inference.resolve_on_face(face, gesture.start.point - current),
                None => Decision::Undecided,
            },
            None => Decision::Undecided,
        };

        let Decision::Resolved(turn) = decision else {
            self.phase = Phase::DirectionPending(gesture);
            return PointerResponse::Pending;
        };

        let Some(grabbed) = self.registry.get(gesture.start.cubelet) else {
            log::warn!("grabbed cubelet {} vanished", gesture.start.cubelet);
            return PointerResponse::GestureDiscarded;
        };
        let slice = SliceTurn::new(turn, turn.axis.of_grid(grabbed.coord()));

        match self.controller.begin(&self.registry, slice) {
            Ok(()) => {
                self.phase = Phase::Rotating(slice);
                PointerResponse::RotationStarted(slice)
            }
            Err(err) => {
                log::warn!("could not start rotation {}: {err}", slice.turn);
                PointerResponse::GestureDiscarded
            }
        }
    }

    /// ポインタ解放
    pub fn pointer_up(&mut self) -> PointerResponse {
        self.discard_gesture()
    }

    /// ポインタのキャンセル（タッチの中断など）
    pub fn pointer_cancel(&mut self) -> PointerResponse {
        self.discard_gesture()
    }

    fn discard_gesture(&mut self) -> PointerResponse {
        match self.phase {
            Phase::GestureStarted(_) | Phase::DirectionPending(_) => {
                log::debug!("gesture discarded");
                self.phase = Phase::Ready;
                PointerResponse::GestureDiscarded
            }
            Phase::Ready | Phase::Rotating(_) => PointerResponse::Ignored,
        }
    }

    /// フレームを進める
    /// 回転が確定した場合はその回転を返す
    pub fn tick(&mut self, delta_ms: f32) -> Option<SliceTurn> {
        if !self.is_rotating() {
            return None;
        }

        match self.controller.tick(&mut self.registry, delta_ms) {
            Ok(None) => None,
            Ok(Some(slice)) => {
                self.phase = Phase::Ready;
                Some(slice)
            }
            Err(err) => {
                log::warn!("rotation dropped: {err}");
                self.phase = Phase::Ready;
                None
            }
        }
    }

    /// 描画用の全CubeletのワールドTransform
    pub fn world_transforms(&self) -> Vec<(CubeletId, Transform)> {
        self.controller.world_transforms(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::*;
    use crate::grid::{Axis, QuarterTurn, Sign};
    use crate::registry::SLICE_SIZE;

    const EDGE: f32 = 1.55;

    fn engine() -> InteractionEngine {
        InteractionEngine::new(CubeConfig::default()).unwrap()
    }

    fn id_at(x: i32, y: i32, z: i32) -> CubeletId {
        CubeletId::from_home(IVec3::new(x, y, z)).unwrap()
    }

    /// +X面上の点をスクリーン座標 (z, y) として返すピッカー
    fn x_face_picker(id: CubeletId) -> impl Fn(f32, f32) -> Option<SurfaceHit> {
        move |sx, sy| Some(SurfaceHit::new(id, Vec3::new(EDGE, sy, sx)))
    }

    fn nothing(_: f32, _: f32) -> Option<SurfaceHit> {
        None
    }

    fn slice_ids(engine: &InteractionEngine, axis: Axis, layer: i32) -> Vec<CubeletId> {
        engine
            .registry()
            .slice_along(axis, layer)
            .unwrap()
            .iter()
            .map(|c| c.id())
            .collect()
    }

    fn run_until_commit(engine: &mut InteractionEngine) -> Option<SliceTurn> {
        for _ in 0..100 {
            if let Some(slice) = engine.tick(16.0) {
                return Some(slice);
            }
        }
        None
    }

    /// (1,1,1) の+X面を掴んで -z 方向へドラッグ
    fn start_y_turn(engine: &mut InteractionEngine) -> PointerResponse {
        let picker = x_face_picker(id_at(1, 1, 1));
        assert_eq!(
            engine.pointer_down(&picker, 1.0, 1.2),
            PointerResponse::GestureStarted
        );
        engine.pointer_move(&picker, 1.45, 1.1)
    }

    #[test]
    fn test_initial_state() {
        let engine = engine();
        assert_eq!(engine.phase(), &Phase::Ready);
        assert!(engine.orbit_enabled());
        assert!(!engine.is_rotating());
        assert!(engine.registry().is_canonical());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CubeConfig {
            gap: -1.0,
            ..Default::default()
        };
        assert!(InteractionEngine::new(config).is_err());
    }

    #[test]
    fn test_config_that_would_stall_rejected() {
        // 回転が90度に届かない
        let config = CubeConfig {
            step_degrees: 1e-30,
            ..Default::default()
        };
        assert!(matches!(
            InteractionEngine::new(config),
            Err(ConfigError::StepTooSmall { .. })
        ));

        // どの面も掴めない
        let config = CubeConfig {
            face_threshold: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            InteractionEngine::new(config),
            Err(ConfigError::FaceThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_scenario_grab_top_corner_and_turn() {
        let mut engine = engine();
        let expected = SliceTurn::new(QuarterTurn::new(Axis::Y, Sign::Negative), 1);

        assert_eq!(start_y_turn(&mut engine), PointerResponse::RotationStarted(expected));
        assert_eq!(engine.phase(), &Phase::Rotating(expected));
        assert!(!engine.orbit_enabled());

        assert_eq!(run_until_commit(&mut engine), Some(expected));
        assert_eq!(engine.phase(), &Phase::Ready);
        assert!(engine.orbit_enabled());

        let registry = engine.registry();
        assert!(registry.is_canonical());
        for cubelet in registry.all_cubelets() {
            let home = cubelet.id().home();
            if home.y == 1 {
                assert_eq!(cubelet.coord(), expected.turn.apply(home));
            } else {
                assert_eq!(cubelet.coord(), home);
            }
        }

        let right = slice_ids(&engine, Axis::X, 1);
        assert_eq!(right.len(), SLICE_SIZE);
        for x in -1..=1 {
            assert!(right.contains(&id_at(x, 1, -1)));
        }
    }

    #[test]
    fn test_layer_comes_from_current_coordinate() {
        let mut engine = engine();
        start_y_turn(&mut engine);
        run_until_commit(&mut engine).unwrap();

        // 初期位置 (1,1,1) のCubeletは -Y 回転で (-1,1,1) に移動済み
        let moved = id_at(1, 1, 1);
        assert_eq!(engine.registry().get(moved).unwrap().coord(), IVec3::new(-1, 1, 1));

        // +Y面を掴んで +z 方向へドラッグ（移動量 z < 0）→ X+ 回転、レイヤーは現在の x
        let picker = move |sx: f32, sy: f32| Some(SurfaceHit::new(moved, Vec3::new(sx, EDGE, sy)));
        engine.pointer_down(&picker, -1.0, 1.0);
        let expected = SliceTurn::new(QuarterTurn::new(Axis::X, Sign::Positive), -1);
        assert_eq!(
            engine.pointer_move(&picker, -1.0, 1.5),
            PointerResponse::RotationStarted(expected)
        );
        assert_eq!(run_until_commit(&mut engine), Some(expected));
        assert!(engine.registry().is_canonical());
    }

    #[test]
    fn test_pending_until_threshold() {
        let mut engine = engine();
        let picker = x_face_picker(id_at(1, 1, 1));
        engine.pointer_down(&picker, 1.0, 1.2);

        assert_eq!(engine.pointer_move(&picker, 1.2, 1.1), PointerResponse::Pending);
        assert!(matches!(engine.phase(), Phase::DirectionPending(_)));
        assert!(!engine.orbit_enabled());

        // 保留中もジェスチャーの開始点は変わらない
        assert!(matches!(
            engine.pointer_move(&picker, 1.45, 1.1),
            PointerResponse::RotationStarted(_)
        ));
    }

    #[test]
    fn test_pointer_down_on_empty_space() {
        let mut engine = engine();
        assert_eq!(engine.pointer_down(&nothing, 10.0, 10.0), PointerResponse::Ignored);
        assert_eq!(engine.phase(), &Phase::Ready);
        assert!(engine.orbit_enabled());
    }

    #[test]
    fn test_pointer_up_discards_gesture() {
        let mut engine = engine();
        let picker = x_face_picker(id_at(1, 0, 0));
        engine.pointer_down(&picker, 0.0, 0.0);
        assert!(!engine.orbit_enabled());

        assert_eq!(engine.pointer_up(), PointerResponse::GestureDiscarded);
        assert_eq!(engine.phase(), &Phase::Ready);
        assert!(engine.orbit_enabled());
        assert_eq!(engine.pointer_up(), PointerResponse::Ignored);
    }

    #[test]
    fn test_pointer_cancel_discards_pending_gesture() {
        let mut engine = engine();
        let picker = x_face_picker(id_at(1, 0, 0));
        engine.pointer_down(&picker, 0.0, 0.0);
        engine.pointer_move(&picker, 0.1, 0.1);
        assert_eq!(engine.pointer_cancel(), PointerResponse::GestureDiscarded);
        assert_eq!(engine.phase(), &Phase::Ready);
    }

    #[test]
    fn test_lost_tracking_stays_pending() {
        let mut engine = engine();
        let picker = x_face_picker(id_at(1, 1, 1));
        engine.pointer_down(&picker, 1.0, 1.2);

        assert_eq!(engine.pointer_move(&nothing, 500.0, 500.0), PointerResponse::Pending);
        match engine.phase() {
            Phase::DirectionPending(gesture) => assert_eq!(gesture.current, None),
            other => panic!("unexpected phase {other:?}"),
        }

        // 戻ってくれば再び判定できる
        assert!(matches!(
            engine.pointer_move(&picker, 1.45, 1.1),
            PointerResponse::RotationStarted(_)
        ));
    }

    #[test]
    fn test_ambiguous_face_never_resolves() {
        let mut engine = engine();
        let center = id_at(0, 0, 0);
        let picker = move |sx: f32, sy: f32| Some(SurfaceHit::new(center, Vec3::new(0.5, sy, sx)));
        engine.pointer_down(&picker, 0.0, 0.0);

        assert_eq!(engine.pointer_move(&picker, 2.0, 2.0), PointerResponse::Pending);
        assert!(!engine.is_rotating());
    }

    #[test]
    fn test_single_flight() {
        let mut engine = engine();
        start_y_turn(&mut engine);
        assert!(engine.is_rotating());

        let phase_before = engine.phase().clone();
        let slices_before: Vec<Vec<CubeletId>> = Axis::ALL
            .iter()
            .flat_map(|&axis| (-1..=1).map(move |layer| (axis, layer)))
            .map(|(axis, layer)| slice_ids(&engine, axis, layer))
            .collect();

        let picker = x_face_picker(id_at(1, -1, -1));
        assert_eq!(engine.pointer_down(&picker, -1.0, -1.2), PointerResponse::Ignored);
        assert_eq!(engine.pointer_move(&picker, 0.0, 0.0), PointerResponse::Ignored);
        assert_eq!(engine.pointer_up(), PointerResponse::Ignored);
        assert_eq!(engine.pointer_cancel(), PointerResponse::Ignored);

        assert_eq!(engine.phase(), &phase_before);
        let slices_after: Vec<Vec<CubeletId>> = Axis::ALL
            .iter()
            .flat_map(|&axis| (-1..=1).map(move |layer| (axis, layer)))
            .map(|(axis, layer)| slice_ids(&engine, axis, layer))
            .collect();
        assert_eq!(slices_before, slices_after);
    }

    #[test]
    fn test_pointer_up_does_not_cancel_rotation() {
        let mut engine = engine();
        start_y_turn(&mut engine);
        engine.pointer_up();
        assert!(engine.is_rotating());
        assert!(run_until_commit(&mut engine).is_some());
    }

    #[test]
    fn test_world_transforms_follow_pivot() {
        let mut engine = engine();
        start_y_turn(&mut engine);
        // 15ティック = 45度
        engine.tick(150.0);

        let corner = id_at(1, 1, 1);
        let bottom = id_at(1, -1, 1);
        let transforms = engine.world_transforms();
        let (_, moved) = transforms.iter().find(|(id, _)| *id == corner).unwrap();
        let (_, still) = transforms.iter().find(|(id, _)| *id == bottom).unwrap();

        let gap = engine.config().gap;
        // (1,1,1) を -45度 (Y) 回すと x = 0, z = sqrt(2)
        assert!(moved.position.x.abs() < 1e-4);
        assert!((moved.position.z - gap * 2f32.sqrt()).abs() < 1e-4);
        assert_eq!(still.position, Vec3::new(gap, -gap, gap));
    }

    #[test]
    fn test_tick_when_ready() {
        let mut engine = engine();
        assert_eq!(engine.tick(1000.0), None);
        assert_eq!(engine.phase(), &Phase::Ready);
    }

    #[test]
    fn test_consecutive_turns_keep_grid() {
        let mut engine = engine();
        for _ in 0..4 {
            start_y_turn(&mut engine);
            assert!(run_until_commit(&mut engine).is_some());
        }
        // 同じ面を同じ方向に4回 → 元通り
        for cubelet in engine.registry().all_cubelets() {
            assert_eq!(cubelet.coord(), cubelet.id().home());
        }
    }
}
