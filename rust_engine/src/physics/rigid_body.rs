//! MMD 刚体

use glam::Vec3;

use crate::{MmdError, Result};

/// 刚体形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidShape {
    Sphere,
    Box,
    Capsule,
}

impl RigidShape {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RigidShape::Sphere),
            1 => Ok(RigidShape::Box),
            2 => Ok(RigidShape::Capsule),
            _ => Err(MmdError::unknown_tag("rigid shape", value)),
        }
    }
}

/// 刚体模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigidMode {
    /// 静态/运动学刚体，跟随骨骼
    Static,
    /// 动态刚体，完全由物理驱动
    Dynamic,
    /// 动态刚体，但位置跟随骨骼（只有旋转由物理驱动）
    DynamicBone,
}

impl RigidMode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RigidMode::Static),
            1 => Ok(RigidMode::Dynamic),
            2 => Ok(RigidMode::DynamicBone),
            _ => Err(MmdError::unknown_tag("rigid mode", value)),
        }
    }
}

/// MMD 刚体
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub name: String,
    pub name_en: String,
    /// 关联的骨骼索引，-1 表示不绑定骨骼
    pub bone_index: i32,
    /// 碰撞组（0~15）
    pub group: u8,
    /// 碰撞掩码：第 N 位置位 = 与组 N 碰撞
    pub collision_mask: u16,
    pub shape: RigidShape,
    /// 形状尺寸（不做坐标交换）
    pub size: Vec3,
    pub position: Vec3,
    /// 欧拉角（弧度）
    pub rotation: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub mode: RigidMode,
}

impl RigidBody {
    pub fn is_static(&self) -> bool {
        self.mode == RigidMode::Static
    }

    pub fn is_bound(&self) -> bool {
        self.bone_index >= 0
    }

    /// 本刚体是否与组 `group` 碰撞
    pub fn collides_with_group(&self, group: u8) -> bool {
        group < 16 && self.collision_mask & (1 << group) != 0
    }
}

/// 展开双向碰撞掩码：任一方掩码不含对方组即视为不碰撞，返回 (i, j)，i < j
pub fn non_collision_pairs(rigid_bodies: &[RigidBody]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in rigid_bodies.iter().enumerate() {
        for (j, b) in rigid_bodies.iter().enumerate().skip(i + 1) {
            if !a.collides_with_group(b.group) || !b.collides_with_group(a.group) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
