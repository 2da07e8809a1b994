//! MMD 关节（6DOF 弹簧约束）

use glam::Vec3;

use crate::{MmdError, Result};

/// 关节类型（目前只有 6DOF 弹簧）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointMode {
    Spring6Dof,
}

impl JointMode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(JointMode::Spring6Dof),
            _ => Err(MmdError::unknown_tag("joint mode", value)),
        }
    }
}

/// MMD 关节
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub name_en: String,
    pub mode: JointMode,
    /// 刚体 A 索引
    pub rigid_body_a: i32,
    /// 刚体 B 索引
    pub rigid_body_b: i32,
    pub position: Vec3,
    pub rotation: Vec3,
    /// 线性下限
    pub linear_lower: Vec3,
    /// 线性上限
    pub linear_upper: Vec3,
    /// 角度下限
    pub angular_lower: Vec3,
    /// 角度上限
    pub angular_upper: Vec3,
    /// 线性弹簧刚度
    pub linear_spring: Vec3,
    /// 角度弹簧刚度
    pub angular_spring: Vec3,
}

impl Joint {
    /// 上下限相等的平移轴（锁定）
    pub fn locked_linear_axes(&self) -> [bool; 3] {
        locked(self.linear_lower, self.linear_upper)
    }

    /// 上下限相等的旋转轴（锁定）
    pub fn locked_angular_axes(&self) -> [bool; 3] {
        locked(self.angular_lower, self.angular_upper)
    }

    /// 两端刚体下标（任一为负则无效）
    pub fn endpoints(&self) -> Option<(usize, usize)> {
        let a = usize::try_from(self.rigid_body_a).ok()?;
        let b = usize::try_from(self.rigid_body_b).ok()?;
        Some((a, b))
    }
}

fn locked(lower: Vec3, upper: Vec3) -> [bool; 3] {
    [lower.x == upper.x, lower.y == upper.y, lower.z == upper.z]
}
