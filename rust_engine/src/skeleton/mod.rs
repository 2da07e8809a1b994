//! 骨骼数据

mod bone;

pub use bone::{
    AngleLimit, AppendTransform, Bone, BoneFlags, DisplayConnection, IkConfig, IkLink, LocalAxis,
};
