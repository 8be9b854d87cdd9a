use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rubik_core::CubeletId;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// 頂点構造体
/// 位置、法線、色を含む
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, normal, color }
    }

    const ATTRIBUTES: [VertexAttribute; 3] = [
        // position
        VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: VertexFormat::Float32x3,
        },
        // normal
        VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as BufferAddress,
            shader_location: 1,
            format: VertexFormat::Float32x3,
        },
        // color
        VertexAttribute {
            offset: std::mem::size_of::<[f32; 6]>() as BufferAddress,
            shader_location: 2,
            format: VertexFormat::Float32x3,
        },
    ];

    /// 頂点バッファレイアウトを取得
    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// 0xRRGGBB を線形RGBに変換
const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// ステッカーの色（+X, -X, +Y, -Y, +Z, -Z の順）
pub const STICKER_COLORS: [[f32; 3]; 6] = [
    rgb(0xff0000),
    rgb(0x00ff00),
    rgb(0x0000ff),
    rgb(0xffff00),
    rgb(0xffffff),
    rgb(0x0ffff0),
];

/// 内側の面の色
pub const INNER_COLOR: [f32; 3] = rgb(0x000000);

/// 面の法線（`STICKER_COLORS` と同じ順）
const FACE_NORMALS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// メッシュ構造体
/// 頂点とインデックスを含む
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// 空のメッシュを作成
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// 原点中心の立方体（面ごとに色指定、`FACE_NORMALS` の順）
    pub fn colored_box(size: f32, colors: [[f32; 3]; 6]) -> Self {
        let half = size * 0.5;
        let mut mesh = Self::new();

        for (normal, color) in FACE_NORMALS.into_iter().zip(colors) {
            // 法線から面上の2軸を作り、外側から見て反時計回りに並べる
            let u = normal.any_orthonormal_vector();
            let v = normal.cross(u);
            let center = normal * half;
            let corners = [
                center - u * half - v * half,
                center + u * half - v * half,
                center + u * half + v * half,
                center - u * half + v * half,
            ];

            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend(
                corners
                    .iter()
                    .map(|p| Vertex::new(p.to_array(), normal.to_array(), color)),
            );
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Cubeletのメッシュ
    /// 生成時に外側を向いている面だけステッカー色、それ以外は黒
    /// 色は頂点に焼き込むので回転してもCubeletと一緒に動く
    pub fn cubelet(id: CubeletId, size: f32) -> Self {
        let home = id.home();
        let outer = [
            home.x == 1,
            home.x == -1,
            home.y == 1,
            home.y == -1,
            home.z == 1,
            home.z == -1,
        ];

        let mut colors = [INNER_COLOR; 6];
        for (i, color) in colors.iter_mut().enumerate() {
            if outer[i] {
                *color = STICKER_COLORS[i];
            }
        }
        Self::colored_box(size, colors)
    }

    /// 頂点数を取得
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// インデックス数を取得
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
