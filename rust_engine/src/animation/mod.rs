//! VMD 动作数据
//!
//! 解码器只保留原始数值；逐骨骼坐标转换、插值通道重映射和手柄计算
//! 在 `interpolation` 中完成。

mod bezier;
mod interpolation;
mod keyframe;
mod vmd_loader;

pub use bezier::{BezierCurve, BezierHandles};
pub use interpolation::{
    bone_interpolation_handles, compatible_quaternion, AxisPermutation, BoneAxisConverter,
    ConvertedBoneKeyframe, SegmentHandles,
};
pub use keyframe::{
    control_points, BoneKeyframe, CameraCurves, CameraKeyframe, IkState, MorphKeyframe,
    PropertyKeyframe, VmdMotion, LOCATION_ROW_OFFSETS, ROTATION_ROW_OFFSET,
};
pub use vmd_loader::{load_vmd, parse_vmd, parse_vmd_with_diagnostics};
