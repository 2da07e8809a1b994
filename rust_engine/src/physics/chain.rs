//! 物理链检测
//!
//! 从刚体/关节拓扑中找出以静态刚体为根、由动态刚体组成的子图：
//! 1. 由关节建立无向邻接表（记录关节下标）
//! 2. 有至少一个非静态邻居的静态刚体为链根
//! 3. 按根下标升序，从每个根 BFS，只经过非静态刚体
//! 4. 每个刚体全局只归属一次（先到先得）
//! 5. 以根刚体命名，按名称关键字分类

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use super::config::{ChainConfig, ChainPatterns};
use super::{Joint, RigidBody};
use crate::model::Model;
use crate::Result;

/// 链分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainGroup {
    Hair,
    Skirt,
    Accessory,
    Other,
}

impl ChainGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            ChainGroup::Hair => "hair",
            ChainGroup::Skirt => "skirt",
            ChainGroup::Accessory => "accessory",
            ChainGroup::Other => "other",
        }
    }
}

impl fmt::Display for ChainGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 物理链：一个静态根刚体及其连通的动态刚体
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub name: String,
    pub group: ChainGroup,
    pub root_rigid_index: usize,
    /// 根刚体绑定的骨骼，-1 表示未绑定
    pub root_bone_index: i32,
    /// 链内刚体（不含根），按 BFS 顺序由根向末端
    pub rigid_indices: Vec<usize>,
    /// 链内刚体绑定的骨骼（跳过未绑定刚体）
    pub bone_indices: Vec<usize>,
    /// 遍历经过的关节（升序）
    pub joint_indices: Vec<usize>,
}

/// 链检测器
#[derive(Debug, Clone)]
pub struct ChainDetector {
    patterns: ChainPatterns,
}

impl Default for ChainDetector {
    fn default() -> Self {
        Self {
            patterns: ChainPatterns::default_patterns().clone(),
        }
    }
}

impl ChainDetector {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        Ok(Self {
            patterns: ChainPatterns::compile(config)?,
        })
    }

    /// 检测模型中的物理链，按根刚体下标排序
    pub fn detect(&self, model: &Model) -> Vec<Chain> {
        self.detect_in(&model.rigid_bodies, &model.joints)
    }

    pub fn detect_in(&self, rigid_bodies: &[RigidBody], joints: &[Joint]) -> Vec<Chain> {
        let neighbors = build_adjacency(rigid_bodies, joints);

        let roots = (0..rigid_bodies.len()).filter(|&i| {
            rigid_bodies[i].is_static()
                && neighbors[i].iter().any(|&(nb, _)| !rigid_bodies[nb].is_static())
        });

        let mut visited = vec![false; rigid_bodies.len()];
        let mut chains = Vec::new();

        for root in roots {
            let mut chain_rigids = Vec::new();
            let mut chain_joints = BTreeSet::new();
            let mut queue = VecDeque::new();

            for &(nb, joint) in &neighbors[root] {
                if rigid_bodies[nb].is_static() || visited[nb] {
                    continue;
                }
                visited[nb] = true;
                queue.push_back(nb);
                chain_rigids.push(nb);
                chain_joints.insert(joint);
            }

            while let Some(current) = queue.pop_front() {
                for &(nb, joint) in &neighbors[current] {
                    if visited[nb] || nb == root || rigid_bodies[nb].is_static() {
                        continue;
                    }
                    visited[nb] = true;
                    queue.push_back(nb);
                    chain_rigids.push(nb);
                    chain_joints.insert(joint);
                }
            }

            if chain_rigids.is_empty() {
                continue;
            }

            let root_body = &rigid_bodies[root];
            let bone_indices = chain_rigids
                .iter()
                .filter_map(|&ri| usize::try_from(rigid_bodies[ri].bone_index).ok())
                .collect();

            chains.push(Chain {
                name: root_body.name.clone(),
                group: self.classify(root_body, rigid_bodies, &chain_rigids),
                root_rigid_index: root,
                root_bone_index: root_body.bone_index,
                rigid_indices: chain_rigids,
                bone_indices,
                joint_indices: chain_joints.into_iter().collect(),
            });
        }

        log::debug!(
            "Detected {} physics chains ({} rigid bodies claimed)",
            chains.len(),
            chains.iter().map(|c| c.rigid_indices.len()).sum::<usize>()
        );

        chains
    }

    /// 合并根与全部成员的名称后按关键字匹配；英文名不参与
    fn classify(&self, root: &RigidBody, rigid_bodies: &[RigidBody], members: &[usize]) -> ChainGroup {
        let mut combined = root.name.clone();
        for &i in members {
            combined.push(' ');
            combined.push_str(&rigid_bodies[i].name);
        }

        if self.patterns.hair.is_match(&combined) {
            ChainGroup::Hair
        } else if self.patterns.skirt.is_match(&combined) {
            ChainGroup::Skirt
        } else if self.patterns.accessory.is_match(&combined) {
            ChainGroup::Accessory
        } else {
            ChainGroup::Other
        }
    }
}

/// 使用默认分类规则检测物理链
pub fn detect_chains(model: &Model) -> Vec<Chain> {
    ChainDetector::default().detect(model)
}

/// 无向邻接表：刚体下标 → [(邻居, 关节下标)]，跳过端点越界的关节
fn build_adjacency(rigid_bodies: &[RigidBody], joints: &[Joint]) -> Vec<Vec<(usize, usize)>> {
    let mut neighbors = vec![Vec::new(); rigid_bodies.len()];
    for (j, joint) in joints.iter().enumerate() {
        let Some((a, b)) = joint.endpoints() else {
            continue;
        };
        if a >= rigid_bodies.len() || b >= rigid_bodies.len() {
            continue;
        }
        neighbors[a].push((b, j));
        neighbors[b].push((a, j));
    }
    neighbors
}
