//! PMX 模型数据
//!
//! 所有位置/法线/旋转均已在解码时转换到右手 Z-up 坐标系。

mod header;
mod loader;
mod material;

pub use header::Header;
pub use loader::{load_pmx, parse_pmx, parse_pmx_with_diagnostics};
pub use material::{Material, MaterialFlags, SphereMode, Toon};

use glam::{Vec2, Vec3, Vec4};

use crate::morph::Morph;
use crate::physics::{Joint, RigidBody};
use crate::skeleton::Bone;

/// 顶点骨骼权重（五种互斥方案）
#[derive(Clone, Debug, PartialEq)]
pub enum VertexWeight {
    Bdef1 { bone: i32 },
    Bdef2 { bones: [i32; 2], weight: f32 },
    Bdef4 { bones: [i32; 4], weights: [f32; 4] },
    Sdef { bones: [i32; 2], weight: f32, c: Vec3, r0: Vec3, r1: Vec3 },
    Qdef { bones: [i32; 4], weights: [f32; 4] },
}

impl VertexWeight {
    /// 展开为 (骨骼索引, 权重) 列表；BDEF2/SDEF 第二骨骼权重为 1 - w
    pub fn bone_weights(&self) -> Vec<(i32, f32)> {
        match *self {
            VertexWeight::Bdef1 { bone } => vec![(bone, 1.0)],
            VertexWeight::Bdef2 { bones, weight } | VertexWeight::Sdef { bones, weight, .. } => {
                vec![(bones[0], weight), (bones[1], 1.0 - weight)]
            }
            VertexWeight::Bdef4 { bones, weights } | VertexWeight::Qdef { bones, weights } => {
                bones.into_iter().zip(weights).collect()
            }
        }
    }

    /// 权重类型标签（文件中的值）
    pub fn type_tag(&self) -> u8 {
        match self {
            VertexWeight::Bdef1 { .. } => 0,
            VertexWeight::Bdef2 { .. } => 1,
            VertexWeight::Bdef4 { .. } => 2,
            VertexWeight::Sdef { .. } => 3,
            VertexWeight::Qdef { .. } => 4,
        }
    }
}

impl Default for VertexWeight {
    fn default() -> Self {
        VertexWeight::Bdef1 { bone: 0 }
    }
}

/// 顶点
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// 追加 UV（0~4 个）
    pub additional_uvs: Vec<Vec4>,
    pub weight: VertexWeight,
    pub edge_scale: f32,
}

/// 纹理路径（原样保留文件中的相对路径）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub path: String,
}

/// 显示枠条目
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayItem {
    Bone(i32),
    Morph(i32),
}

/// 显示枠
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrame {
    pub name: String,
    pub name_en: String,
    /// 特殊枠（Root / 表情）
    pub is_special: bool,
    pub items: Vec<DisplayItem>,
}

/// PMX 模型
///
/// 由解码器一次性创建，之后不再修改。各表按文件顺序存放，通过下标互相引用。
#[derive(Clone, Debug)]
pub struct Model {
    pub header: Header,
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
    pub vertices: Vec<Vertex>,
    /// 三角形（已反转绕序）
    pub faces: Vec<[u32; 3]>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub morphs: Vec<Morph>,
    pub display_frames: Vec<DisplayFrame>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<Joint>,
}

impl Model {
    /// 按日文名查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// 按日文名查找 Morph
    pub fn find_morph_by_name(&self, name: &str) -> Option<usize> {
        self.morphs.iter().position(|m| m.name == name)
    }

    /// 材质所覆盖的面索引总数（应等于 3 × 三角形数）
    pub fn material_index_total(&self) -> u64 {
        self.materials.iter().map(|m| u64::from(m.face_count)).sum()
    }

    /// 各材质在三角形列表上的连续区间 (起始三角形, 三角形数)
    pub fn material_face_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = Vec::with_capacity(self.materials.len());
        let mut begin = 0usize;
        for material in &self.materials {
            let count = material.face_count as usize / 3;
            ranges.push((begin, count));
            begin += count;
        }
        ranges
    }
}
