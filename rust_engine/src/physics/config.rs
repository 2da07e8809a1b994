//! 物理链分类配置
//!
//! 所有参数扁平化，默认值即内置的日文 + 英文关键字。

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::Result;

/// 头发默认关键字
pub const DEFAULT_HAIR_PATTERN: &str = "髪|hair|前髪|後髪|横髪|ポニテ|ponytail|twintail|ツインテ";
/// 裙子默认关键字
pub const DEFAULT_SKIRT_PATTERN: &str = "スカート|skirt|裾";
/// 饰品默认关键字
pub const DEFAULT_ACCESSORY_PATTERN: &str = "リボン|ribbon|ネクタイ|tie|アクセ|acc";

/// 链分类配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// 头发（优先级最高）
    pub hair_pattern: String,
    /// 裙子
    pub skirt_pattern: String,
    /// 饰品
    pub accessory_pattern: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            hair_pattern: DEFAULT_HAIR_PATTERN.to_string(),
            skirt_pattern: DEFAULT_SKIRT_PATTERN.to_string(),
            accessory_pattern: DEFAULT_ACCESSORY_PATTERN.to_string(),
        }
    }
}

/// 编译后的分类正则
#[derive(Debug, Clone)]
pub(crate) struct ChainPatterns {
    pub hair: Regex,
    pub skirt: Regex,
    pub accessory: Regex,
}

impl ChainPatterns {
    pub fn compile(config: &ChainConfig) -> Result<Self> {
        Ok(Self {
            hair: case_insensitive(&config.hair_pattern)?,
            skirt: case_insensitive(&config.skirt_pattern)?,
            accessory: case_insensitive(&config.accessory_pattern)?,
        })
    }

    /// 默认模式只编译一次
    pub fn default_patterns() -> &'static ChainPatterns {
        static DEFAULT: Lazy<ChainPatterns> = Lazy::new(|| ChainPatterns {
            hair: case_insensitive(DEFAULT_HAIR_PATTERN).expect("default hair pattern"),
            skirt: case_insensitive(DEFAULT_SKIRT_PATTERN).expect("default skirt pattern"),
            accessory: case_insensitive(DEFAULT_ACCESSORY_PATTERN).expect("default accessory pattern"),
        });
        &DEFAULT
    }
}

fn case_insensitive(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
