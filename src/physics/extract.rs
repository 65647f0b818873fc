//! 姿态反推
//!
//! 沿与正向运动学相同的层级，从粒子世界位置恢复相对角度：
//! - ground_tilt = atan2(核心中点 - root) - π/2，核心中点取 torso 与 waist 的平均
//! - offset = root 位置 - 画布中心（镜头跟随 root）
//! - local = atan2(child - parent) - parent_world_angle
//! - neck 无存储角度，按刚性跟随 torso 处理，head 从重建后的 neck 位置测量

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;

use super::body::PhysicsBody;
use crate::config::{get_config, PuppetConfig};
use crate::skeleton::{wrap_angle, JointId, Pose, BONES};

/// 使用全局配置反推姿态
pub fn extract_pose_from_physics_body(body: &PhysicsBody, reference: &Pose) -> Pose {
    extract_pose_from_physics_body_with(body, reference, &get_config())
}

/// 反推姿态
///
/// `reference` 作为结构模板：粒子无法决定的字段原样保留。
pub fn extract_pose_from_physics_body_with(
    body: &PhysicsBody,
    reference: &Pose,
    config: &PuppetConfig,
) -> Pose {
    let mut pose = *reference;

    let (Some(root), Some(torso), Some(waist)) = (
        body.position(JointId::Root),
        body.position(JointId::Torso),
        body.position(JointId::Waist),
    ) else {
        return pose;
    };

    let core = (torso + waist) * 0.5;
    let ground_angle = (core.y - root.y).atan2(core.x - root.x) - FRAC_PI_2;
    pose.ground_tilt = wrap_angle(ground_angle);
    pose.offset = root - config.canvas_center();

    let mut world_angles: [Option<f32>; JointId::COUNT] = [None; JointId::COUNT];
    // 子节点测量方向的起点：有角度的关节取粒子位置，neck 取刚性跟随 torso 的重建位置
    let mut anchors: [Option<Vec2>; JointId::COUNT] = [None; JointId::COUNT];
    world_angles[JointId::Root.index()] = Some(ground_angle);
    anchors[JointId::Root.index()] = Some(root);

    // 拓扑序遍历：父角度未知（分支中断）时子树全部跳过
    for def in BONES.iter() {
        let (Some(parent_angle), Some(parent)) =
            (world_angles[def.parent.index()], anchors[def.parent.index()])
        else {
            continue;
        };
        let Some(child) = body.position(def.child) else {
            continue;
        };

        if pose.angle(def.child).is_none() {
            // 无存储角度：运动学中刚性跟随父节点，粒子的偏移无法表示
            world_angles[def.child.index()] = Some(parent_angle);
            anchors[def.child.index()] = Some(parent + Vec2::from_angle(parent_angle) * def.length);
            continue;
        }

        let delta = child - parent;
        let child_angle = delta.y.atan2(delta.x);
        world_angles[def.child.index()] = Some(child_angle);
        anchors[def.child.index()] = Some(child);
        pose.set_angle(def.child, wrap_angle(child_angle - parent_angle));
    }

    pose
}
