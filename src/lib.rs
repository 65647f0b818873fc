//! Puppet Engine - 2D 火柴人姿态与布娃娃物理运行时
//!
//! 数据流：
//! Pose → compute_skeleton → Skeleton → create_physics_body_from_pose → PhysicsBody
//!      → [update_physics_body]* → extract_pose_from_physics_body → Pose
//!
//! 渲染、UI、帧调度都在外部，本库只负责纯计算。

pub mod config;
pub mod physics;
pub mod skeleton;

use thiserror::Error;

pub use config::{get_config, reset_config, set_config, PuppetConfig};
pub use physics::{
    create_physics_body_from_pose, create_physics_body_from_pose_with,
    extract_pose_from_physics_body, extract_pose_from_physics_body_with, update_physics_body,
    update_physics_body_with, PhysicsBody, PhysicsConstraint, PhysicsParticle, RagdollSession,
};
pub use skeleton::{
    compute_skeleton, compute_skeleton_with, wrap_angle, BoneSegment, BoneShape, JointFlags,
    JointId, LimbAngles, Point, Pose, Side, Skeleton,
};

/// 引擎错误类型
#[derive(Debug, Error)]
pub enum PuppetError {
    /// 无法识别的关节键（例如 "left.tail"）
    #[error("unknown joint key: {0}")]
    UnknownJoint(String),

    /// 配置无效
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PuppetError>;
