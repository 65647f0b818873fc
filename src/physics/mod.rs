//! 布娃娃物理 - 粒子 + 距离约束的 Verlet 模拟
//!
//! 流程：create_physics_body_from_pose → 每帧 [update_physics_body → extract_pose_from_physics_body]
//!
//! - body: 由骨架构建粒子/约束图（质量、静止长度）
//! - solver: 积分、约束松弛、防旋转阻尼、边界碰撞
//! - extract: 从粒子位置反推层级相对角度
//! - session: 外部帧循环持有的会话状态

mod body;
mod extract;
mod session;
mod solver;

pub use body::{
    create_physics_body_from_pose, create_physics_body_from_pose_with, PhysicsBody,
    PhysicsConstraint, PhysicsParticle,
};
pub use extract::{extract_pose_from_physics_body, extract_pose_from_physics_body_with};
pub use session::RagdollSession;
pub use solver::{update_physics_body, update_physics_body_with};
