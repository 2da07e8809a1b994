//! 贝塞尔曲线插值

use glam::Vec2;

/// 贝塞尔曲线（用于 VMD 动画插值）
///
/// 控制点归一化到 [0, 1]，端点固定为 (0, 0) 与 (1, 1)。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    /// 线性插值（MMD 默认控制点 20/20/107/107）
    pub fn linear() -> Self {
        Self::from_vmd_data(&[20, 20, 107, 107])
    }

    /// 从 VMD 插值数据创建，顺序 (x1, y1, x2, y2)，取值 0~127
    pub fn from_vmd_data(data: &[u8; 4]) -> Self {
        Self {
            x1: data[0] as f32 / 127.0,
            y1: data[1] as f32 / 127.0,
            x2: data[2] as f32 / 127.0,
            y2: data[3] as f32 / 127.0,
        }
    }

    /// 两个相邻关键帧 (帧, 值) 之间的手柄；帧差为 0 时没有手柄
    pub fn handles(&self, start: Vec2, end: Vec2) -> Option<BezierHandles> {
        let delta = end - start;
        if delta.x == 0.0 {
            return None;
        }
        Some(BezierHandles {
            right: start + delta * Vec2::new(self.x1, self.y1),
            left: start + delta * Vec2::new(self.x2, self.y2),
        })
    }
}

/// 一段曲线的两个手柄，坐标为 (帧, 值)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierHandles {
    /// 前一关键帧的右手柄
    pub right: Vec2,
    /// 后一关键帧的左手柄
    pub left: Vec2,
}
