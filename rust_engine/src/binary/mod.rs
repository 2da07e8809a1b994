//! 二进制读取层
//!
//! 提供小端序顺序读取游标和长度前缀文本解码，PMX/VMD 解码器都建立在它之上。

mod cursor;
mod text;

pub use cursor::{BinaryCursor, IndexWidth};
pub use text::{decode_shift_jis, Encoding};
