//! 解码诊断信息收集
//!
//! 可恢复事件（VMD 区段截断、全零四元数修复）既写入调用方传入的
//! `Diagnostics`，也同步输出到 `log`。不使用任何全局状态。

use std::fmt;

/// 诊断事件类型
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// 区段在声明数量读满之前数据耗尽
    Truncated {
        section: &'static str,
        decoded: usize,
        declared: usize,
    },
    /// 全零四元数被修复为单位四元数
    ZeroQuaternionRepaired { context: String },
}

/// 单条诊断
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Truncated { section, decoded, declared } => write!(
                f,
                "Truncated {} section: decoded {} of {} entries",
                section, decoded, declared
            ),
            DiagnosticKind::ZeroQuaternionRepaired { context } => {
                write!(f, "Zero quaternion repaired to identity: {}", context)
            }
        }
    }
}

/// 诊断收集器
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录区段截断（warn 级别）
    pub fn truncated(&mut self, section: &'static str, decoded: usize, declared: usize) {
        self.push(
            DiagnosticKind::Truncated { section, decoded, declared },
            log::Level::Warn,
        );
    }

    /// 记录四元数修复（debug 级别，属于已知的历史数据问题）
    pub fn zero_quaternion(&mut self, context: impl Into<String>) {
        self.push(
            DiagnosticKind::ZeroQuaternionRepaired { context: context.into() },
            log::Level::Debug,
        );
    }

    fn push(&mut self, kind: DiagnosticKind, level: log::Level) {
        let diagnostic = Diagnostic { kind };
        log::log!(level, "{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否存在截断事件
    pub fn has_truncation(&self) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::Truncated { .. }))
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
