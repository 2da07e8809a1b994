//! 骨骼节点

use glam::Vec3;

/// 骨骼标志（16 位）
///
/// 标志字决定骨骼记录中哪些可选字段存在，必须先于这些字段读取。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoneFlags(pub u16);

impl BoneFlags {
    /// 显示连接：1 = 骨骼索引，0 = 坐标偏移
    pub const TAIL_IS_BONE: u16 = 0x0001;
    pub const ROTATABLE: u16 = 0x0002;
    pub const MOVABLE: u16 = 0x0004;
    pub const VISIBLE: u16 = 0x0008;
    pub const CONTROLLABLE: u16 = 0x0010;
    pub const IK: u16 = 0x0020;
    pub const APPEND_LOCAL: u16 = 0x0080;
    pub const APPEND_ROTATE: u16 = 0x0100;
    pub const APPEND_TRANSLATE: u16 = 0x0200;
    pub const FIXED_AXIS: u16 = 0x0400;
    pub const LOCAL_AXIS: u16 = 0x0800;
    pub const AFTER_PHYSICS: u16 = 0x1000;
    pub const EXTERNAL_PARENT: u16 = 0x2000;

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn tail_is_bone(self) -> bool {
        self.contains(Self::TAIL_IS_BONE)
    }

    pub fn is_rotatable(self) -> bool {
        self.contains(Self::ROTATABLE)
    }

    pub fn is_movable(self) -> bool {
        self.contains(Self::MOVABLE)
    }

    pub fn is_visible(self) -> bool {
        self.contains(Self::VISIBLE)
    }

    pub fn is_controllable(self) -> bool {
        self.contains(Self::CONTROLLABLE)
    }

    pub fn is_ik(self) -> bool {
        self.contains(Self::IK)
    }

    pub fn is_append_local(self) -> bool {
        self.contains(Self::APPEND_LOCAL)
    }

    pub fn is_append_rotate(self) -> bool {
        self.contains(Self::APPEND_ROTATE)
    }

    pub fn is_append_translate(self) -> bool {
        self.contains(Self::APPEND_TRANSLATE)
    }

    /// 附加变换记录存在（旋转或平移任一）
    pub fn has_append(self) -> bool {
        self.is_append_rotate() || self.is_append_translate()
    }

    pub fn has_fixed_axis(self) -> bool {
        self.contains(Self::FIXED_AXIS)
    }

    pub fn has_local_axis(self) -> bool {
        self.contains(Self::LOCAL_AXIS)
    }

    pub fn deform_after_physics(self) -> bool {
        self.contains(Self::AFTER_PHYSICS)
    }

    pub fn has_external_parent(self) -> bool {
        self.contains(Self::EXTERNAL_PARENT)
    }
}

/// 显示连接（尾端）：骨骼索引或相对偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayConnection {
    Bone(i32),
    Offset(Vec3),
}

/// 附加变换（付与）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppendTransform {
    pub parent: i32,
    pub rate: f32,
}

/// 本地轴
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalAxis {
    pub x: Vec3,
    pub z: Vec3,
}

/// IK 角度限制（弧度，已转换坐标）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleLimit {
    pub min: Vec3,
    pub max: Vec3,
}

/// IK 链接信息
#[derive(Clone, Debug, PartialEq)]
pub struct IkLink {
    pub bone_index: i32,
    pub limits: Option<AngleLimit>,
}

impl IkLink {
    pub fn has_limits(&self) -> bool {
        self.limits.is_some()
    }
}

/// IK 配置
///
/// 链接顺序即从 IK 骨骼向外的运动链顺序。
#[derive(Clone, Debug, PartialEq)]
pub struct IkConfig {
    pub target_bone: i32,
    pub iterations: i32,
    pub limit_angle: f32,
    pub links: Vec<IkLink>,
}

impl IkConfig {
    /// 链接骨骼与目标骨骼相同的位置（合法但需要调用方特殊处理）
    pub fn links_on_target(&self) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.bone_index == self.target_bone)
            .map(|(i, _)| i)
            .collect()
    }
}

/// 骨骼节点
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    pub name_en: String,
    /// 初始位置（模型空间）
    pub position: Vec3,
    /// 父骨骼索引，-1 为根
    pub parent_index: i32,
    pub transform_level: i32,
    pub flags: BoneFlags,
    pub display_connection: DisplayConnection,
    pub append: Option<AppendTransform>,
    pub fixed_axis: Option<Vec3>,
    pub local_axis: Option<LocalAxis>,
    pub external_parent: Option<i32>,
    pub ik: Option<IkConfig>,
}

impl Bone {
    pub fn new(name: String) -> Self {
        Self {
            name,
            name_en: String::new(),
            position: Vec3::ZERO,
            parent_index: -1,
            transform_level: 0,
            flags: BoneFlags::default(),
            display_connection: DisplayConnection::Bone(-1),
            append: None,
            fixed_axis: None,
            local_axis: None,
            external_parent: None,
            ik: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}
