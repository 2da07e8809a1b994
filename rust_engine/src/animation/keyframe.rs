//! 动画关键帧
//!
//! 保留 VMD 原始空间的数值，坐标转换由逐骨骼的 `BoneAxisConverter` 完成。

use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use super::BezierCurve;

/// 插值块中 X/Y/Z 位移行的起始偏移
pub const LOCATION_ROW_OFFSETS: [usize; 3] = [0, 16, 32];
/// 旋转行的起始偏移（四个分量共用一条曲线）
pub const ROTATION_ROW_OFFSET: usize = 48;

/// 从 64 字节插值块的某一行取 (x1, y1, x2, y2)，行内步长为 4
pub fn control_points(interpolation: &[u8; 64], row_offset: usize) -> [u8; 4] {
    [
        interpolation[row_offset],
        interpolation[row_offset + 4],
        interpolation[row_offset + 8],
        interpolation[row_offset + 12],
    ]
}

/// 骨骼关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct BoneKeyframe {
    pub bone_name: String,
    pub frame: u32,
    pub location: Vec3,
    pub rotation: Quat,
    /// 原始 64 字节插值块（描述从上一关键帧到本帧的曲线）
    pub interpolation: [u8; 64],
}

impl BoneKeyframe {
    /// 按原始行偏移取曲线
    pub fn curve(&self, row_offset: usize) -> BezierCurve {
        BezierCurve::from_vmd_data(&control_points(&self.interpolation, row_offset))
    }

    pub fn rotation_curve(&self) -> BezierCurve {
        self.curve(ROTATION_ROW_OFFSET)
    }
}

/// Morph 关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct MorphKeyframe {
    pub morph_name: String,
    pub frame: u32,
    pub weight: f32,
}

/// 相机插值曲线
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraCurves {
    pub x: BezierCurve,
    pub y: BezierCurve,
    pub z: BezierCurve,
    pub rotation: BezierCurve,
    pub distance: BezierCurve,
    pub fov: BezierCurve,
}

/// 相机关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct CameraKeyframe {
    pub frame: u32,
    pub distance: f32,
    /// 注视点
    pub location: Vec3,
    /// 欧拉角（弧度）
    pub rotation: Vec3,
    /// 原始 24 字节插值块：6 组 × (x1, x2, y1, y2)
    pub interpolation: [u8; 24],
    /// 视角（度）
    pub fov: u32,
    pub orthographic: bool,
}

impl CameraKeyframe {
    /// 顺序: X, Y, Z, 旋转, 距离, 视角
    pub fn curves(&self) -> CameraCurves {
        let curve = |group: usize| {
            let b = &self.interpolation[group * 4..group * 4 + 4];
            BezierCurve::from_vmd_data(&[b[0], b[2], b[1], b[3]])
        };
        CameraCurves {
            x: curve(0),
            y: curve(1),
            z: curve(2),
            rotation: curve(3),
            distance: curve(4),
            fov: curve(5),
        }
    }
}

/// IK 开关状态
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IkState {
    pub name: String,
    pub enabled: bool,
}

/// 属性关键帧（显示 + IK 开关）
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyKeyframe {
    pub frame: u32,
    pub visible: bool,
    pub ik_states: Vec<IkState>,
}

/// VMD 动作
///
/// 各序列按文件顺序存放，不保证按帧排序。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VmdMotion {
    pub model_name: String,
    pub bone_keyframes: Vec<BoneKeyframe>,
    pub morph_keyframes: Vec<MorphKeyframe>,
    pub camera_keyframes: Vec<CameraKeyframe>,
    pub property_keyframes: Vec<PropertyKeyframe>,
}

impl VmdMotion {
    /// 按骨骼名分组，组内按帧排序
    pub fn bone_tracks(&self) -> BTreeMap<&str, Vec<&BoneKeyframe>> {
        let mut tracks: BTreeMap<&str, Vec<&BoneKeyframe>> = BTreeMap::new();
        for keyframe in &self.bone_keyframes {
            tracks.entry(keyframe.bone_name.as_str()).or_default().push(keyframe);
        }
        for track in tracks.values_mut() {
            track.sort_by_key(|k| k.frame);
        }
        tracks
    }

    /// 按 Morph 名分组，组内按帧排序
    pub fn morph_tracks(&self) -> BTreeMap<&str, Vec<&MorphKeyframe>> {
        let mut tracks: BTreeMap<&str, Vec<&MorphKeyframe>> = BTreeMap::new();
        for keyframe in &self.morph_keyframes {
            tracks.entry(keyframe.morph_name.as_str()).or_default().push(keyframe);
        }
        for track in tracks.values_mut() {
            track.sort_by_key(|k| k.frame);
        }
        tracks
    }

    /// 所有序列中的最大帧号
    pub fn max_frame(&self) -> u32 {
        let bones = self.bone_keyframes.iter().map(|k| k.frame);
        let morphs = self.morph_keyframes.iter().map(|k| k.frame);
        let cameras = self.camera_keyframes.iter().map(|k| k.frame);
        let properties = self.property_keyframes.iter().map(|k| k.frame);
        bones
            .chain(morphs)
            .chain(cameras)
            .chain(properties)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.bone_keyframes.is_empty()
            && self.morph_keyframes.is_empty()
            && self.camera_keyframes.is_empty()
            && self.property_keyframes.is_empty()
    }
}
