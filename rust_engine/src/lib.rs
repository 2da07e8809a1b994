//! MMD 资源解码核心
//!
//! 将 MikuMikuDance 生态的二进制资源解码为强类型的内存数据：
//! - PMX 模型解析（顶点、面、材质、骨骼、Morph、显示枠、刚体、关节）
//! - VMD 动作解析（骨骼/Morph/相机/属性关键帧）
//! - 坐标系转换（MMD 左手 Y-up → 右手 Z-up）
//! - 贝塞尔插值块解码与逐骨骼轴置换
//! - 物理链检测
//!
//! 只负责解码，不写文件，也不构建场景对象。

pub mod animation;
pub mod binary;
pub mod coordinate;
pub mod diagnostics;
pub mod model;
pub mod morph;
pub mod physics;
pub mod skeleton;

#[cfg(test)]
pub(crate) mod test_util;

pub use animation::{load_vmd, parse_vmd, VmdMotion};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use model::{load_pmx, parse_pmx, Model};
pub use physics::{detect_chains, Chain, ChainDetector, ChainGroup};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too small for {format} header: {len} bytes")]
    TooSmall { format: &'static str, len: usize },

    #[error("Not a {format} file (bad signature)")]
    BadMagic { format: &'static str },

    #[error("Unsupported PMX version: {0}")]
    UnsupportedVersion(f32),

    #[error("Invalid PMX header: {0}")]
    InvalidHeader(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown {kind} tag: {value}")]
    UnknownTag { kind: &'static str, value: u8 },

    #[error("Unexpected end of data at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid chain pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl MmdError {
    pub(crate) fn unknown_tag(kind: &'static str, value: u8) -> Self {
        MmdError::UnknownTag { kind, value }
    }

    /// 是否为截断错误（VMD 解码据此决定是否降级为警告）
    pub fn is_truncation(&self) -> bool {
        matches!(self, MmdError::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, MmdError>;
