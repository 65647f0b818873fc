//! 骨骼系统 - 2D 正向运动学
//!
//! 核心设计思想：
//! - JointId / BONES: 固定的枚举键层级表，编译期确定
//! - Pose: 相对角度描述的姿态
//! - Skeleton: 每帧由 Pose 推导出的世界空间关节与骨段，无独立生命周期

mod joint;
mod kinematics;
mod pose;

pub use joint::{BoneDef, JointFlags, JointId, Side, BONES};
pub use kinematics::{compute_skeleton, compute_skeleton_with};
pub use pose::{wrap_angle, LimbAngles, Pose};

use std::collections::BTreeMap;

use glam::Vec2;

// ============================================================================
// 公共类型定义
// ============================================================================

/// 世界空间点（Y 轴向下）
pub type Point = Vec2;

/// 骨段绘制形状
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoneShape {
    Line,
    Polygon,
    Curve,
    Circle,
}

/// 可渲染骨段
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneSegment {
    /// 终点关节键
    pub key: JointId,
    /// 起点（父关节位置，自定义形状的枢轴）
    pub start: Point,
    /// 终点（子关节位置，用于长度与命中检测）
    pub end: Point,
    /// 宽度（命中检测与贴图绑定）
    pub width: f32,
    /// 世界角度
    pub angle: f32,
    pub shape: BoneShape,
}

impl BoneSegment {
    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// 点到骨段（线段）的最短距离
    pub fn distance_to(&self, point: Point) -> f32 {
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        if len_sq < f32::EPSILON {
            return point.distance(self.start);
        }
        let t = ((point - self.start).dot(axis) / len_sq).clamp(0.0, 1.0);
        point.distance(self.start + axis * t)
    }
}

/// 骨架：世界空间关节位置 + 有序骨段列表
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub joints: BTreeMap<JointId, Point>,
    pub bones: Vec<BoneSegment>,
}

impl Skeleton {
    /// 查询关节世界位置
    #[inline]
    pub fn joint(&self, id: JointId) -> Option<Point> {
        self.joints.get(&id).copied()
    }

    /// 查询以某关节为终点的骨段
    pub fn bone(&self, id: JointId) -> Option<&BoneSegment> {
        self.bones.iter().find(|bone| bone.key == id)
    }

    /// 命中检测：返回最上层（最后绘制）且点落在其宽度内的骨段
    ///
    /// ground 不参与命中检测。
    pub fn bone_at(&self, point: Point) -> Option<&BoneSegment> {
        self.bones
            .iter()
            .rev()
            .filter(|bone| !bone.key.is_synthetic())
            .find(|bone| bone.distance_to(point) <= bone.width * 0.5)
    }
}
