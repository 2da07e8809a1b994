//! Morph 定义

use super::{
    BoneMorphOffset, GroupMorphOffset, MaterialMorphOffset, MorphCategory, MorphType,
    UvMorphOffset, VertexMorphOffset,
};

/// 偏移记录列表，每个 Morph 只有一种形状
#[derive(Clone, Debug, PartialEq)]
pub enum MorphOffsets {
    Group(Vec<GroupMorphOffset>),
    Vertex(Vec<VertexMorphOffset>),
    Bone(Vec<BoneMorphOffset>),
    Uv(Vec<UvMorphOffset>),
    Material(Vec<MaterialMorphOffset>),
}

/// Morph 变形
#[derive(Clone, Debug, PartialEq)]
pub struct Morph {
    pub name: String,
    pub name_en: String,
    pub category: MorphCategory,
    pub morph_type: MorphType,
    pub offsets: MorphOffsets,
}

impl Morph {
    /// 组 Morph 引用的子 Morph 下标（可能成环，调用方需自行防护）
    pub fn referenced_morphs(&self) -> Vec<i32> {
        match &self.offsets {
            MorphOffsets::Group(offsets) => offsets.iter().map(|o| o.morph_index).collect(),
            _ => Vec::new(),
        }
    }
}
