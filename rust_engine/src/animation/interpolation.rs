//! 逐骨骼的动作坐标转换与插值通道重映射
//!
//! VMD 关键帧位于骨骼本地空间。Y/Z 交换会按骨骼静止姿态改变本地轴，
//! 所以每根骨骼需要各自的转换矩阵，以及插值行与位移通道的对应关系。

use glam::{Mat3, Quat, Vec2, Vec3};

use super::keyframe::{control_points, BoneKeyframe, LOCATION_ROW_OFFSETS, ROTATION_ROW_OFFSET};
use super::{BezierCurve, BezierHandles};

/// 位移通道 → 插值行的置换
///
/// 贪心选取：每次取剩余行列中绝对值最大的元素（并列时取行、列下标最小者），
/// 把该行映射到该列，然后移除此行此列。只是启发式，斜向姿态下可能不准。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisPermutation {
    indices: [usize; 3],
}

impl Default for AxisPermutation {
    fn default() -> Self {
        Self { indices: [0, 1, 2] }
    }
}

impl AxisPermutation {
    pub fn from_matrix(mat: &Mat3) -> Self {
        let mut indices = [0, 1, 2];
        let mut row_used = [false; 3];
        let mut col_used = [false; 3];

        for _ in 0..3 {
            let mut best: Option<(usize, usize, f32)> = None;
            for i in (0..3).filter(|&i| !row_used[i]) {
                for j in (0..3).filter(|&j| !col_used[j]) {
                    // glam 列主序：第 i 行第 j 列
                    let value = mat.col(j)[i].abs();
                    if best.map_or(true, |(_, _, b)| value > b) {
                        best = Some((i, j, value));
                    }
                }
            }
            if let Some((i, j, _)) = best {
                indices[i] = j;
                row_used[i] = true;
                col_used[j] = true;
            }
        }

        Self { indices }
    }

    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    /// 目标空间第 k 个位移通道使用的插值行偏移
    pub fn location_row_offsets(&self) -> [usize; 3] {
        self.indices.map(|i| LOCATION_ROW_OFFSETS[i])
    }
}

/// 单根骨骼的关键帧转换器
#[derive(Clone, Copy, Debug)]
pub struct BoneAxisConverter {
    mat: Mat3,
    rotation: Quat,
    permutation: AxisPermutation,
}

impl BoneAxisConverter {
    /// `rest` 为骨骼静止姿态在目标空间的 3×3 矩阵（骨骼本地 → 模型空间）
    pub fn new(rest: Mat3) -> Self {
        // 交换 Y/Z 行后转置
        let mat = Mat3::from_cols(rest.row(0), rest.row(2), rest.row(1));
        // 交换一行后行列式为负，取反得到对应的纯旋转，共轭结果不变
        let proper = if mat.determinant() < 0.0 { -mat } else { mat };
        Self {
            mat,
            rotation: Quat::from_mat3(&proper).normalize(),
            permutation: AxisPermutation::from_matrix(&mat),
        }
    }

    pub fn matrix(&self) -> Mat3 {
        self.mat
    }

    pub fn permutation(&self) -> AxisPermutation {
        self.permutation
    }

    pub fn convert_location(&self, location: Vec3) -> Vec3 {
        self.mat * location
    }

    pub fn convert_rotation(&self, rotation: Quat) -> Quat {
        (self.rotation * rotation * self.rotation.conjugate()).normalize()
    }

    /// 转换一条按帧排序的骨骼轨道，相邻四元数保持同号
    pub fn convert_track(&self, keyframes: &[&BoneKeyframe]) -> Vec<ConvertedBoneKeyframe> {
        let mut converted: Vec<ConvertedBoneKeyframe> = Vec::with_capacity(keyframes.len());
        for keyframe in keyframes {
            let mut rotation = self.convert_rotation(keyframe.rotation);
            if let Some(prev) = converted.last() {
                rotation = compatible_quaternion(prev.rotation, rotation);
            }
            converted.push(ConvertedBoneKeyframe {
                frame: keyframe.frame,
                location: self.convert_location(keyframe.location),
                rotation,
            });
        }
        converted
    }

    /// 相邻两帧之间各通道的手柄，控制点取自后一帧的插值块
    pub fn segment_handles(
        &self,
        start: &ConvertedBoneKeyframe,
        end: &ConvertedBoneKeyframe,
        interpolation: &[u8; 64],
    ) -> SegmentHandles {
        let (f0, f1) = (start.frame as f32, end.frame as f32);
        let offsets = self.permutation.location_row_offsets();
        let location = [0, 1, 2].map(|k| {
            bone_interpolation_handles(
                interpolation,
                offsets[k],
                Vec2::new(f0, start.location[k]),
                Vec2::new(f1, end.location[k]),
            )
        });
        let (q0, q1) = (start.rotation.to_array(), end.rotation.to_array());
        let rotation = [0, 1, 2, 3].map(|k| {
            bone_interpolation_handles(
                interpolation,
                ROTATION_ROW_OFFSET,
                Vec2::new(f0, q0[k]),
                Vec2::new(f1, q1[k]),
            )
        });
        SegmentHandles { location, rotation }
    }
}

/// 转换到目标骨骼本地空间后的关键帧
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvertedBoneKeyframe {
    pub frame: u32,
    pub location: Vec3,
    pub rotation: Quat,
}

/// 一段曲线上各通道的手柄；旋转按 (x, y, z, w) 分量排列
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHandles {
    pub location: [Option<BezierHandles>; 3],
    pub rotation: [Option<BezierHandles>; 4],
}

/// q 与 -q 表示同一旋转；取离 `prev` 更近的一个，避免插值绕远路
pub fn compatible_quaternion(prev: Quat, curr: Quat) -> Quat {
    let (p, c) = (glam::Vec4::from(prev), glam::Vec4::from(curr));
    if (p + c).length_squared() < (p - c).length_squared() {
        -curr
    } else {
        curr
    }
}

/// 按行偏移读取控制点，计算 (帧, 值) 平面上的一对手柄
pub fn bone_interpolation_handles(
    interpolation: &[u8; 64],
    row_offset: usize,
    start: Vec2,
    end: Vec2,
) -> Option<BezierHandles> {
    BezierCurve::from_vmd_data(&control_points(interpolation, row_offset)).handles(start, end)
}
