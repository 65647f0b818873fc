//! 物理体构建
//!
//! 每个非合成关节 → 一个粒子（初速度为零）；
//! 每条两端都有粒子的层级边 → 一个距离约束（静止长度取构建时的实际距离）。

use std::collections::HashMap;

use glam::Vec2;

use crate::config::{get_config, PuppetConfig};
use crate::skeleton::{compute_skeleton_with, JointId, Pose, BONES};

/// 粒子（Verlet：以上一帧位置隐式表示速度）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParticle {
    pub id: JointId,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    /// 质量；0 表示不可移动的锚点
    pub mass: f32,
}

impl PhysicsParticle {
    /// 静止粒子
    pub fn new(id: JointId, pos: Vec2, mass: f32) -> Self {
        Self { id, pos, prev_pos: pos, mass }
    }

    /// 当前帧隐式速度（位移/帧）
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev_pos
    }

    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.mass <= 0.0
    }
}

/// 距离约束（粒子数组下标对）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConstraint {
    pub particle_a: usize,
    pub particle_b: usize,
    /// 构建时确定，模拟过程中不变
    pub rest_length: f32,
}

/// 物理体：粒子数组 + 约束数组 + 关节→下标映射
///
/// 仅由当前会话独占；关闭物理时直接丢弃。
#[derive(Clone, Debug, Default)]
pub struct PhysicsBody {
    pub particles: Vec<PhysicsParticle>,
    pub constraints: Vec<PhysicsConstraint>,
    pub particle_map: HashMap<JointId, usize>,
}

impl PhysicsBody {
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// 按关节查找粒子下标
    #[inline]
    pub fn index_of(&self, id: JointId) -> Option<usize> {
        self.particle_map.get(&id).copied()
    }

    pub fn particle(&self, id: JointId) -> Option<&PhysicsParticle> {
        self.index_of(id).and_then(|i| self.particles.get(i))
    }

    pub fn particle_mut(&mut self, id: JointId) -> Option<&mut PhysicsParticle> {
        let index = self.index_of(id)?;
        self.particles.get_mut(index)
    }

    /// 粒子当前位置
    #[inline]
    pub fn position(&self, id: JointId) -> Option<Vec2> {
        self.particle(id).map(|p| p.pos)
    }

    /// 给所有可移动粒子附加一个统一速度（位移/帧）
    pub fn add_velocity(&mut self, velocity: Vec2) {
        for p in self.particles.iter_mut().filter(|p| !p.is_anchor()) {
            p.prev_pos -= velocity;
        }
    }
}

/// 关节质量：躯干重（稳定），手脚轻（灵敏），其余默认
pub(crate) fn joint_mass(id: JointId, config: &PuppetConfig) -> f32 {
    if id.is_core() {
        config.core_mass
    } else if id.is_extremity() {
        config.extremity_mass
    } else {
        config.default_mass
    }
}

/// 使用全局配置从姿态构建物理体
pub fn create_physics_body_from_pose(pose: &Pose) -> PhysicsBody {
    create_physics_body_from_pose_with(pose, &get_config())
}

/// 从姿态构建物理体
pub fn create_physics_body_from_pose_with(pose: &Pose, config: &PuppetConfig) -> PhysicsBody {
    let skeleton = compute_skeleton_with(pose, config);

    let mut body = PhysicsBody {
        particles: Vec::with_capacity(skeleton.joints.len()),
        constraints: Vec::with_capacity(BONES.len()),
        particle_map: HashMap::with_capacity(skeleton.joints.len()),
    };

    // 第一步：关节 → 粒子（ground 只用于显示，跳过）
    for (&id, &point) in skeleton.joints.iter() {
        if id.is_synthetic() {
            continue;
        }
        body.particle_map.insert(id, body.particles.len());
        body.particles.push(PhysicsParticle::new(id, point, joint_mass(id, config)));
    }

    // 第二步：层级边 → 距离约束
    for def in BONES.iter() {
        let (Some(a), Some(b)) = (body.index_of(def.parent), body.index_of(def.child)) else {
            continue;
        };
        let rest_length = (body.particles[b].pos - body.particles[a].pos).length();
        if rest_length > config.min_rest_length {
            body.constraints.push(PhysicsConstraint {
                particle_a: a,
                particle_b: b,
                rest_length,
            });
        } else {
            // 近零长度会在求解时除零
            log::warn!(
                "[Ragdoll] 骨骼 {} → {} 长度 {:.4} 过短，跳过约束",
                def.parent, def.child, rest_length
            );
        }
    }

    log::info!(
        "[Ragdoll] 物理体构建完成: {} 粒子, {} 约束",
        body.particles.len(),
        body.constraints.len()
    );

    body
}
