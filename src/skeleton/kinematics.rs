//! 正向运动学
//!
//! 从 root 出发沿层级累积世界角度：
//! child_world_angle = parent_world_angle + pose.angle(child)
//! child_position = parent_position + length * (cos, sin)(child_world_angle)

use std::collections::BTreeMap;

use glam::Vec2;

use super::joint::{JointId, BONES};
use super::pose::Pose;
use super::{BoneSegment, BoneShape, Skeleton};
use crate::config::{get_config, PuppetConfig};

/// 使用全局配置计算骨架
pub fn compute_skeleton(pose: &Pose) -> Skeleton {
    compute_skeleton_with(pose, &get_config())
}

/// 计算骨架（纯函数，无副作用）
pub fn compute_skeleton_with(pose: &Pose, config: &PuppetConfig) -> Skeleton {
    let mut joints = BTreeMap::new();
    let mut bones = Vec::with_capacity(BONES.len() + 1);
    let mut world_angles: [Option<f32>; JointId::COUNT] = [None; JointId::COUNT];

    // 地面独立于层级，固定在画布高度
    let ground = Vec2::new(config.canvas_width * 0.5, config.ground_y);
    joints.insert(JointId::Ground, ground);
    bones.push(BoneSegment {
        key: JointId::Ground,
        start: ground,
        end: ground,
        width: 0.0,
        angle: pose.ground_tilt,
        shape: BoneShape::Line,
    });

    let root = config.canvas_center() + pose.offset;
    joints.insert(JointId::Root, root);
    world_angles[JointId::Root.index()] = Some(pose.ground_tilt);

    // BONES 为拓扑序，父节点总是先于子节点求出
    for def in BONES.iter() {
        let (Some(&start), Some(parent_angle)) =
            (joints.get(&def.parent), world_angles[def.parent.index()])
        else {
            continue;
        };

        // neck 没有存储角度，刚性跟随 torso
        let angle = parent_angle + pose.angle(def.child).unwrap_or(0.0);
        let end = start + Vec2::from_angle(angle) * def.length;

        world_angles[def.child.index()] = Some(angle);
        joints.insert(def.child, end);
        bones.push(BoneSegment {
            key: def.child,
            start,
            end,
            width: def.width,
            angle,
            shape: def.shape,
        });
    }

    Skeleton { joints, bones }
}
