//! Morph 数据

mod morph;

pub use morph::{Morph, MorphOffsets};

use glam::{Quat, Vec3, Vec4};

use crate::{MmdError, Result};

/// Morph 类型（决定偏移记录的形状）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphType {
    Group,
    Vertex,
    Bone,
    Uv,
    AdditionalUv1,
    AdditionalUv2,
    AdditionalUv3,
    AdditionalUv4,
    Material,
}

impl MorphType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MorphType::Group),
            1 => Ok(MorphType::Vertex),
            2 => Ok(MorphType::Bone),
            3 => Ok(MorphType::Uv),
            4 => Ok(MorphType::AdditionalUv1),
            5 => Ok(MorphType::AdditionalUv2),
            6 => Ok(MorphType::AdditionalUv3),
            7 => Ok(MorphType::AdditionalUv4),
            8 => Ok(MorphType::Material),
            _ => Err(MmdError::unknown_tag("morph type", value)),
        }
    }

    /// UV 通道：0 为基本 UV，1~4 为追加 UV
    pub fn uv_channel(self) -> Option<u8> {
        match self {
            MorphType::Uv => Some(0),
            MorphType::AdditionalUv1 => Some(1),
            MorphType::AdditionalUv2 => Some(2),
            MorphType::AdditionalUv3 => Some(3),
            MorphType::AdditionalUv4 => Some(4),
            MorphType::Group | MorphType::Vertex | MorphType::Bone | MorphType::Material => None,
        }
    }
}

/// 操作面板分类
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphCategory {
    System,
    Eyebrow,
    Eye,
    Mouth,
    Other,
}

impl MorphCategory {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MorphCategory::System),
            1 => Ok(MorphCategory::Eyebrow),
            2 => Ok(MorphCategory::Eye),
            3 => Ok(MorphCategory::Mouth),
            4 => Ok(MorphCategory::Other),
            _ => Err(MmdError::unknown_tag("morph category", value)),
        }
    }
}

/// 组 Morph 偏移（引用其他 Morph）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupMorphOffset {
    pub morph_index: i32,
    pub factor: f32,
}

/// 顶点 Morph 偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexMorphOffset {
    pub vertex_index: u32,
    pub offset: Vec3,
}

/// 骨骼 Morph 偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneMorphOffset {
    pub bone_index: i32,
    pub translation: Vec3,
    pub rotation: Quat,
}

/// UV Morph 偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvMorphOffset {
    pub vertex_index: u32,
    pub offset: Vec4,
}

/// 材质 Morph 运算方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialMorphOperation {
    Multiply,
    Add,
}

/// 材质 Morph 偏移
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialMorphOffset {
    /// -1 表示作用于全部材质
    pub material_index: i32,
    pub operation: MaterialMorphOperation,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_strength: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_tint: Vec4,
    pub environment_tint: Vec4,
    pub toon_tint: Vec4,
}

impl MaterialMorphOffset {
    pub fn targets_all_materials(&self) -> bool {
        self.material_index < 0
    }
}
