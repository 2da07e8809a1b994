//! 小端序二进制游标

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Vec2, Vec3, Vec4};

use crate::{MmdError, Result};

/// 索引字节宽度（PMX 头部 globals 声明，1/2/4 字节）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    One,
    Two,
    Four,
}

impl IndexWidth {
    /// 从头部字节解析，只接受 1、2、4
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            1 => Some(IndexWidth::One),
            2 => Some(IndexWidth::Two),
            4 => Some(IndexWidth::Four),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IndexWidth::One => 1,
            IndexWidth::Two => 2,
            IndexWidth::Four => 4,
        }
    }
}

/// 只读、只前进的字节游标
///
/// 每次读取恰好消耗声明的宽度；剩余字节不足时返回 `MmdError::Truncated`，
/// 且游标位置保持不变。
pub struct BinaryCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> BinaryCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(bytes),
        }
    }

    /// 当前偏移
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// 缓冲区总长度
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 剩余未读字节数
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// 检查剩余字节是否足够
    pub fn has_remaining(&self, needed: usize) -> bool {
        self.remaining() >= needed
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.has_remaining(needed) {
            Ok(())
        } else {
            Err(MmdError::Truncated {
                offset: self.position(),
                needed,
                remaining: self.remaining(),
            })
        }
    }

    /// 读取 n 个原始字节（借用底层缓冲区）
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let start = self.position();
        let bytes: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + n) as u64);
        Ok(&bytes[start..start + n])
    }

    /// 读取定长字节数组
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// 跳过 n 个字节
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// 跳过至多 n 个字节，返回实际跳过的字节数
    pub fn skip_saturating(&mut self, n: usize) -> usize {
        let step = n.min(self.remaining());
        let target = self.position() + step;
        self.inner.set_position(target as u64);
        step
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.inner.read_i8()?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    /// 读取 N 个连续 f32
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        self.ensure(N * 4)?;
        let mut out = [0f32; N];
        self.inner.read_f32_into::<LittleEndian>(&mut out)?;
        Ok(out)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        self.read_f32_array::<2>().map(Vec2::from_array)
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        self.read_f32_array::<3>().map(Vec3::from_array)
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        self.read_f32_array::<4>().map(Vec4::from_array)
    }

    /// 有符号变宽索引，-1 表示无引用
    pub fn read_signed_index(&mut self, width: IndexWidth) -> Result<i32> {
        match width {
            IndexWidth::One => self.read_i8().map(i32::from),
            IndexWidth::Two => self.read_i16().map(i32::from),
            IndexWidth::Four => self.read_i32(),
        }
    }

    /// 无符号变宽索引（仅顶点索引使用）
    pub fn read_unsigned_index(&mut self, width: IndexWidth) -> Result<u32> {
        match width {
            IndexWidth::One => self.read_u8().map(u32::from),
            IndexWidth::Two => self.read_u16().map(u32::from),
            IndexWidth::Four => self.read_u32(),
        }
    }
}
