//! Cubelet Registry
//!
//! 27個のCubeletの識別子・現在のグリッド座標・向きを保持する唯一の情報源。
//! 位置は常に整数座標から導出するため、回転を重ねても誤差が蓄積しない。

use std::collections::HashSet;
use std::fmt;

use glam::{IVec3, Vec3};
use serde::Serialize;

use crate::config::CubeConfig;
use crate::error::RegistryError;
use crate::grid::{Axis, Orientation, QuarterTurn};
use crate::transform::Transform;

/// Cubeletの数
pub const CUBELET_COUNT: usize = 27;

/// 1スライスあたりのCubelet数
pub const SLICE_SIZE: usize = 9;

/// グリッド座標が {-1, 0, 1}^3 に収まるか
#[inline]
pub fn on_grid(coord: IVec3) -> bool {
    coord.cmpge(IVec3::NEG_ONE).all() && coord.cmple(IVec3::ONE).all()
}

// ============================================================================
// CubeletId
// ============================================================================

/// Cubelet識別子
/// 生成時のグリッド座標（ホーム座標）で決まり、回転しても変わらない。
/// 内部値は生成順のインデックス（x, y, z の順に -1..=1 を回した順）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeletId(u8);

impl CubeletId {
    /// ホーム座標からIDを作成（グリッド外ならNone）
    pub fn from_home(home: IVec3) -> Option<Self> {
        if !on_grid(home) {
            return None;
        }
        let index = (home.x + 1) * 9 + (home.y + 1) * 3 + (home.z + 1);
        Some(Self(index as u8))
    }

    /// 生成順インデックス（0..27）
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// ホーム座標
    pub fn home(self) -> IVec3 {
        let i = self.0 as i32;
        IVec3::new(i / 9 - 1, (i / 3) % 3 - 1, i % 3 - 1)
    }

    /// JS用の数値ID
    #[inline]
    pub fn to_u32(self) -> u32 {
        self.0 as u32
    }

    /// JS用IDから復元
    pub fn from_u32(id: u32) -> Option<Self> {
        (id < CUBELET_COUNT as u32).then_some(Self(id as u8))
    }
}

impl fmt::Display for CubeletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let home = self.home();
        write!(f, "{},{},{}", home.x, home.y, home.z)
    }
}

// ============================================================================
// Cubelet
// ============================================================================

/// 27個のうちの1つのサブキューブ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cubelet {
    id: CubeletId,
    coord: IVec3,
    orientation: Orientation,
}

impl Cubelet {
    fn at_home(id: CubeletId) -> Self {
        Self {
            id,
            coord: id.home(),
            orientation: Orientation::IDENTITY,
        }
    }

    pub fn id(&self) -> CubeletId {
        self.id
    }

    /// 現在のグリッド座標
    pub fn coord(&self) -> IVec3 {
        self.coord
    }

    /// 現在の向き
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// ワールド座標（グリッド座標 × 間隔）
    pub fn position(&self, gap: f32) -> Vec3 {
        self.coord.as_vec3() * gap
    }

    /// 静止時のワールドTransform
    pub fn rest_transform(&self, gap: f32) -> Transform {
        Transform::from_position_rotation(self.position(gap), self.orientation.to_quat())
    }
}

/// JS向けのCubelet状態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeletSnapshot {
    pub id: u32,
    pub name: String,
    pub home: [i32; 3],
    pub coord: [i32; 3],
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

// ============================================================================
// CubeletRegistry
// ============================================================================

/// Cubeletの管理コンテナ
#[derive(Debug, Clone)]
pub struct CubeletRegistry {
    gap: f32,
    slice_epsilon: f32,
    /// CubeletId::index() 順
    cubelets: Vec<Cubelet>,
}

impl CubeletRegistry {
    /// 初期状態（全Cubeletがホーム座標・回転なし）のRegistryを作成
    pub fn new(config: &CubeConfig) -> Self {
        let cubelets = (0..CUBELET_COUNT as u8)
            .map(|i| Cubelet::at_home(CubeletId(i)))
            .collect();

        Self {
            gap: config.gap,
            slice_epsilon: config.slice_epsilon,
            cubelets,
        }
    }

    /// グリッド間隔
    pub fn gap(&self) -> f32 {
        self.gap
    }

    /// 全Cubelet（27個、生成順）
    pub fn all_cubelets(&self) -> &[Cubelet] {
        &self.cubelets
    }

    /// IDでCubeletを取得
    pub fn get(&self, id: CubeletId) -> Option<&Cubelet> {
        self.cubelets.get(id.index())
    }

    /// 現在指定座標にあるCubeletを取得
    pub fn cubelet_at(&self, coord: IVec3) -> Option<&Cubelet> {
        self.cubelets.iter().find(|c| c.coord == coord)
    }

    /// 軸に垂直なスライス（指定レイヤー）に含まれるCubeletを取得
    /// 位置の許容誤差付きで判定する
    pub fn slice_along(&self, axis: Axis, layer: i32) -> Result<Vec<&Cubelet>, RegistryError> {
        if !(-1..=1).contains(&layer) {
            return Err(RegistryError::InvalidLayer(layer));
        }

        let plane = layer as f32 * self.gap;
        Ok(self
            .cubelets
            .iter()
            .filter(|c| (axis.of(c.position(self.gap)) - plane).abs() < self.slice_epsilon)
            .collect())
    }

    /// グループに90度回転を確定させる
    /// 検証に失敗した場合は何も変更しない
    pub fn commit_rotation(
        &mut self,
        group: &[CubeletId],
        turn: QuarterTurn,
    ) -> Result<(), RegistryError> {
        let mut members = HashSet::with_capacity(group.len());
        for &id in group {
            if !members.insert(id) {
                return Err(RegistryError::DuplicateCubelet(id));
            }
        }

        // 回転後の座標がグループの元の占有セルと一致すること（衝突なし）
        let occupied: HashSet<IVec3> = group.iter().map(|&id| self.cubelets[id.index()].coord).collect();
        for &id in group {
            let coord = turn.apply(self.cubelets[id.index()].coord);
            if !on_grid(coord) {
                return Err(RegistryError::OffGrid { id, coord });
            }
            if !occupied.contains(&coord) {
                return Err(RegistryError::Collision { id, coord });
            }
        }

        for &id in group {
            let cubelet = &mut self.cubelets[id.index()];
            cubelet.coord = turn.apply(cubelet.coord);
            cubelet.orientation = cubelet.orientation.then(turn);
        }

        debug_assert!(self.is_canonical());
        Ok(())
    }

    /// 全Cubeletの静止時Transform
    pub fn rest_transforms(&self) -> impl Iterator<Item = (CubeletId, Transform)> + '_ {
        self.cubelets
            .iter()
            .map(|c| (c.id, c.rest_transform(self.gap)))
    }

    /// グリッド不変条件（27点への全単射かつ正しい回転）を満たすか
    pub fn is_canonical(&self) -> bool {
        let coords: HashSet<IVec3> = self.cubelets.iter().map(|c| c.coord).collect();
        coords.len() == CUBELET_COUNT
            && self
                .cubelets
                .iter()
                .all(|c| on_grid(c.coord) && c.orientation.is_proper_rotation())
    }

    /// JS向けスナップショット
    pub fn snapshot(&self) -> Vec<CubeletSnapshot> {
        self.cubelets
            .iter()
            .map(|c| {
                let position = c.position(self.gap);
                let rotation = c.orientation.to_quat();
                CubeletSnapshot {
                    id: c.id.to_u32(),
                    name: c.id.to_string(),
                    home: c.id.home().to_array(),
                    coord: c.coord.to_array(),
                    position: position.to_array(),
                    rotation: rotation.to_array(),
                }
            })
            .collect()
    }
}
