//! 坐标系转换：MMD（左手系，Y 轴向上）→ 右手系，Z 轴向上
//!
//! 所有规则只在解码时应用一次：
//! - 位置/法线/偏移：(x, y, z) → (x, z, y)
//! - 欧拉角：(x, y, z) → (x, z, y)
//! - 四元数：(x, y, z, w) → (x, z, -y, w)
//! - 三角形：(a, b, c) → (c, b, a)

use glam::{Quat, Vec3};

/// 位置转换（Y/Z 交换，自逆）
pub fn convert_position(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// 欧拉角转换，与位置转换相同的交换，但语义上是不同的量
pub fn convert_rotation(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// 四元数转换：轴交换，并对新的 y 分量取负以修正手性
pub fn convert_quaternion(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, q.z, -q.y, q.w)
}

/// 反转三角形绕序
pub fn reverse_winding<T: Copy>(face: [T; 3]) -> [T; 3] {
    [face[2], face[1], face[0]]
}

/// 全零四元数修复为单位四元数，返回是否发生了修复
pub fn repair_zero_quaternion(q: Quat) -> (Quat, bool) {
    if q.x == 0.0 && q.y == 0.0 && q.z == 0.0 && q.w == 0.0 {
        (Quat::IDENTITY, true)
    } else {
        (q, false)
    }
}
