//! 文本解码
//!
//! PMX 文本字段：int32 字节长度前缀 + 按头部编码（UTF-16LE / UTF-8）的字节。
//! VMD 文本字段：定长、以 0 填充的 Shift-JIS（CP932）。
//! 解码失败的字节用替换字符代替，不中断解析。

use super::BinaryCursor;
use crate::Result;

/// PMX 文本编码
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf16Le,
    Utf8,
}

impl Encoding {
    /// globals[0]：0 → UTF-16LE，1 → UTF-8，其余按 UTF-16LE 处理
    pub fn from_byte(value: u8) -> Self {
        if value == 1 {
            Encoding::Utf8
        } else {
            Encoding::Utf16Le
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        let encoding = match self {
            Encoding::Utf16Le => encoding_rs::UTF_16LE,
            Encoding::Utf8 => encoding_rs::UTF_8,
        };
        let (decoded, _) = encoding.decode_without_bom_handling(bytes);
        decoded.into_owned()
    }
}

/// 解码 Shift-JIS 字符串（截断到第一个 null 字节）
pub fn decode_shift_jis(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}

impl<'a> BinaryCursor<'a> {
    /// 读取长度前缀文本，长度为 0 时返回空串
    pub fn read_text(&mut self, encoding: Encoding) -> Result<String> {
        let length = self.read_i32()?;
        if length == 0 {
            return Ok(String::new());
        }
        // 负长度按不可满足的读取处理
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        let bytes = self.read_bytes(length)?;
        Ok(encoding.decode(bytes))
    }

    /// 读取定长 Shift-JIS 文本字段
    pub fn read_fixed_text(&mut self, width: usize) -> Result<String> {
        self.read_bytes(width).map(decode_shift_jis)
    }
}
