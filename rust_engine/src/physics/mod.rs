//! MMD 物理数据模块
//!
//! 只解码刚体与关节描述，不做物理模拟；
//! 在此之上提供碰撞掩码展开和物理链检测。

mod chain;
pub mod config;
mod joint;
mod rigid_body;

pub use chain::{detect_chains, Chain, ChainDetector, ChainGroup};
pub use config::ChainConfig;
pub use joint::{Joint, JointMode};
pub use rigid_body::{non_collision_pairs, RigidBody, RigidMode, RigidShape};
