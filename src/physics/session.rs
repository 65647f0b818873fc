//! 布娃娃会话 - 外部帧循环持有的状态
//!
//! 流程：set_enabled(true) → 每帧 advance(dt) → set_enabled(false)
//!
//! 物理体只在开启期间存在；关闭时立即丢弃，再次开启总是从
//! 最近一次外部设置的姿态重新构建，不会恢复旧的粒子状态。

use super::body::{create_physics_body_from_pose_with, PhysicsBody};
use super::extract::extract_pose_from_physics_body_with;
use super::solver::update_physics_body_with;
use crate::config::{get_config, PuppetConfig};
use crate::skeleton::Pose;

/// 布娃娃会话
pub struct RagdollSession {
    /// 最近一次外部设置的姿态
    target_pose: Pose,
    /// 下一帧反推使用的模板，同时是重新构建物理体的来源
    latest_pose: Pose,
    /// 当前对外显示的姿态
    pose: Pose,
    /// 物理体（None 表示物理关闭）
    body: Option<PhysicsBody>,
    /// 上一次实际使用的步长
    last_dt: Option<f32>,
    config: PuppetConfig,
}

impl RagdollSession {
    /// 使用全局配置创建（物理默认关闭）
    pub fn new(pose: Pose) -> Self {
        Self::with_config(pose, get_config())
    }

    pub fn with_config(pose: Pose, config: PuppetConfig) -> Self {
        Self {
            target_pose: pose,
            latest_pose: pose,
            pose,
            body: None,
            last_dt: None,
            config,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.body.is_some()
    }

    /// 当前显示姿态
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// 最近一次外部设置的姿态
    #[inline]
    pub fn target_pose(&self) -> &Pose {
        &self.target_pose
    }

    #[inline]
    pub fn body(&self) -> Option<&PhysicsBody> {
        self.body.as_ref()
    }

    /// 供驱动方施加冲量等直接修改
    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut PhysicsBody> {
        self.body.as_mut()
    }

    #[inline]
    pub fn last_dt(&self) -> Option<f32> {
        self.last_dt
    }

    #[inline]
    pub fn config(&self) -> &PuppetConfig {
        &self.config
    }

    /// 外部（UI / 时间轴）设置姿态
    ///
    /// 物理关闭时直接显示；开启时不重建物理体，但作为下一帧模板，
    /// 且下次开启物理时从它构建。
    pub fn set_target_pose(&mut self, pose: Pose) {
        self.target_pose = pose;
        self.latest_pose = pose;
        if self.body.is_none() {
            self.pose = pose;
        }
    }

    /// 开关物理
    pub fn set_enabled(&mut self, enabled: bool) {
        match (enabled, self.body.is_some()) {
            (true, false) => {
                self.body = Some(create_physics_body_from_pose_with(&self.latest_pose, &self.config));
                self.last_dt = None;
                log::info!("[Ragdoll] 物理开启");
            }
            (false, true) => {
                self.body = None;
                self.last_dt = None;
                self.pose = self.target_pose;
                self.latest_pose = self.target_pose;
                log::info!("[Ragdoll] 物理关闭，恢复外部姿态");
            }
            _ => {}
        }
    }

    /// 从新的基础姿态重新开始（物理开启时立即重建物理体）
    pub fn restart(&mut self, pose: Pose) {
        self.target_pose = pose;
        self.latest_pose = pose;
        self.pose = pose;
        self.last_dt = None;
        if self.body.is_some() {
            self.body = Some(create_physics_body_from_pose_with(&pose, &self.config));
        }
    }

    /// 推进一帧
    ///
    /// `dt` 超过 `max_time_step` 时被截断；`dt <= 0` 或非有限值时不步进。
    pub fn advance(&mut self, dt: f32) -> &Pose {
        let Some(body) = self.body.as_mut() else {
            return &self.pose;
        };
        if !dt.is_finite() || dt <= 0.0 {
            return &self.pose;
        }

        let dt = dt.min(self.config.max_time_step);
        update_physics_body_with(body, dt, &self.config);
        let next = extract_pose_from_physics_body_with(body, &self.latest_pose, &self.config);

        self.latest_pose = next;
        self.pose = next;
        self.last_dt = Some(dt);
        &self.pose
    }
}
