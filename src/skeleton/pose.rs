//! 姿态数据
//!
//! 纯数据：所有角度为弧度，均相对于父关节累积后的世界角度。

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

use super::joint::{JointId, Side};

/// 单侧四肢角度
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LimbAngles {
    pub shoulder: f32,
    pub elbow: f32,
    pub hand: f32,
    pub hip: f32,
    pub knee: f32,
    pub foot: f32,
}

/// 角色姿态
///
/// 形状固定且完整：每个具名关节都有角度，没有可选字段。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// root 的世界角度
    pub ground_tilt: f32,
    /// 相对画布中心的整体平移
    pub offset: Vec2,
    pub torso: f32,
    pub waist: f32,
    pub head: f32,
    pub left: LimbAngles,
    pub right: LimbAngles,
}

impl Default for Pose {
    /// 默认 T 姿态：手臂水平，双腿竖直，脚尖朝外
    fn default() -> Self {
        Self {
            ground_tilt: 0.0,
            offset: Vec2::ZERO,
            torso: -FRAC_PI_2,
            waist: FRAC_PI_2,
            head: 0.0,
            left: LimbAngles {
                shoulder: FRAC_PI_2,
                foot: -FRAC_PI_2,
                ..LimbAngles::default()
            },
            right: LimbAngles {
                shoulder: -FRAC_PI_2,
                foot: FRAC_PI_2,
                ..LimbAngles::default()
            },
        }
    }
}

impl Pose {
    #[inline]
    pub fn limb(&self, side: Side) -> &LimbAngles {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    pub fn limb_mut(&mut self, side: Side) -> &mut LimbAngles {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// 关节的局部角度
    ///
    /// root、neck、ground 不存储角度，返回 None（运动学按零旋转处理）。
    pub fn angle(&self, joint: JointId) -> Option<f32> {
        use JointId::*;
        match joint {
            Torso => Some(self.torso),
            Waist => Some(self.waist),
            Head => Some(self.head),
            Root | Neck | Ground => None,
            _ => {
                let limb = self.limb(joint.side()?);
                match joint {
                    LeftShoulder | RightShoulder => Some(limb.shoulder),
                    LeftElbow | RightElbow => Some(limb.elbow),
                    LeftHand | RightHand => Some(limb.hand),
                    LeftHip | RightHip => Some(limb.hip),
                    LeftKnee | RightKnee => Some(limb.knee),
                    LeftFoot | RightFoot => Some(limb.foot),
                    _ => None,
                }
            }
        }
    }

    /// 关节局部角度的可变引用
    pub fn angle_mut(&mut self, joint: JointId) -> Option<&mut f32> {
        use JointId::*;
        match joint {
            Torso => Some(&mut self.torso),
            Waist => Some(&mut self.waist),
            Head => Some(&mut self.head),
            Root | Neck | Ground => None,
            _ => {
                let side = joint.side()?;
                let limb = self.limb_mut(side);
                match joint {
                    LeftShoulder | RightShoulder => Some(&mut limb.shoulder),
                    LeftElbow | RightElbow => Some(&mut limb.elbow),
                    LeftHand | RightHand => Some(&mut limb.hand),
                    LeftHip | RightHip => Some(&mut limb.hip),
                    LeftKnee | RightKnee => Some(&mut limb.knee),
                    LeftFoot | RightFoot => Some(&mut limb.foot),
                    _ => None,
                }
            }
        }
    }

    /// 写入关节局部角度；无存储角度的关节返回 false
    pub fn set_angle(&mut self, joint: JointId, value: f32) -> bool {
        match self.angle_mut(joint) {
            Some(angle) => {
                *angle = value;
                true
            }
            None => false,
        }
    }
}

/// 将角度规范到 (-π, π]
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
