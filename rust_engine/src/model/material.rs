//! MMD 材质

use glam::{Vec3, Vec4};

use crate::{MmdError, Result};

/// 材质绘制标志（8 位）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterialFlags(pub u8);

impl MaterialFlags {
    pub const DOUBLE_SIDED: u8 = 0x01;
    pub const GROUND_SHADOW: u8 = 0x02;
    pub const SELF_SHADOW_MAP: u8 = 0x04;
    pub const SELF_SHADOW: u8 = 0x08;
    pub const TOON_EDGE: u8 = 0x10;
    // PMX 2.1
    pub const VERTEX_COLOR: u8 = 0x20;
    pub const POINT_DRAW: u8 = 0x40;
    pub const LINE_DRAW: u8 = 0x80;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn is_double_sided(self) -> bool {
        self.contains(Self::DOUBLE_SIDED)
    }

    pub fn has_ground_shadow(self) -> bool {
        self.contains(Self::GROUND_SHADOW)
    }

    pub fn casts_self_shadow(self) -> bool {
        self.contains(Self::SELF_SHADOW_MAP)
    }

    pub fn receives_self_shadow(self) -> bool {
        self.contains(Self::SELF_SHADOW)
    }

    pub fn has_toon_edge(self) -> bool {
        self.contains(Self::TOON_EDGE)
    }
}

/// 球面贴图混合模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SphereMode {
    Off,
    Multiply,
    Add,
    SubTexture,
}

impl SphereMode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SphereMode::Off),
            1 => Ok(SphereMode::Multiply),
            2 => Ok(SphereMode::Add),
            3 => Ok(SphereMode::SubTexture),
            _ => Err(MmdError::unknown_tag("sphere mode", value)),
        }
    }
}

/// Toon 贴图：独立纹理索引，或共享的内置 toon01~toon10
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toon {
    Texture(i32),
    Shared(u8),
}

impl Toon {
    /// 内置 toon 文件名（toon01.bmp ~ toon10.bmp）
    pub fn shared_file_name(self) -> Option<String> {
        match self {
            Toon::Shared(index) => Some(format!("toon{:02}.bmp", u32::from(index) + 1)),
            Toon::Texture(_) => None,
        }
    }
}

/// MMD 材质
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub name_en: String,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_strength: f32,
    pub ambient: Vec3,
    pub flags: MaterialFlags,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_index: i32,
    pub sphere_texture_index: i32,
    pub sphere_mode: SphereMode,
    pub toon: Toon,
    /// 备注
    pub comment: String,
    /// 该材质消耗的面索引数（不是三角形数）
    pub face_count: u32,
}

impl Material {
    /// 该材质覆盖的三角形数
    pub fn triangle_count(&self) -> u32 {
        self.face_count / 3
    }
}
