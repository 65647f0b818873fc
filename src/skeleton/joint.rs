//! 关节定义与静态层级表
//!
//! 层级在编译期固定，不允许运行时修改：
//! - JointId: 枚举键，替代 "left.hip" 这类字符串分发
//! - JointFlags: 质量分级、地面碰撞、防旋转等分类标志
//! - BONES: 按父→子拓扑序排列的骨骼边表

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::BoneShape;
use crate::PuppetError;

// ============================================================================
// 关节标志
// ============================================================================

bitflags! {
    /// 关节分类标志位
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct JointFlags: u32 {
        /// 核心躯干（高质量）
        const CORE = 1 << 0;
        /// 手（低质量）
        const HAND = 1 << 1;
        /// 脚（低质量，与地面线碰撞）
        const FOOT = 1 << 2;
        /// 参与防旋转阻尼
        const SPIN_DAMPED = 1 << 3;
        /// 合成关节，不参与运动学与物理
        const SYNTHETIC = 1 << 4;
        /// 四肢末端
        const EXTREMITY = Self::HAND.bits() | Self::FOOT.bits();
    }
}

// ============================================================================
// 关节键
// ============================================================================

/// 身体左右侧
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub fn key(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// 关节键
///
/// 声明顺序即粒子顺序（Skeleton::joints 按此排序）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointId {
    Root,
    Waist,
    Torso,
    Neck,
    Head,
    LeftShoulder,
    LeftElbow,
    LeftHand,
    RightShoulder,
    RightElbow,
    RightHand,
    LeftHip,
    LeftKnee,
    LeftFoot,
    RightHip,
    RightKnee,
    RightFoot,
    Ground,
}

impl JointId {
    /// 关节总数（含合成的 ground）
    pub const COUNT: usize = 18;

    pub const ALL: [JointId; Self::COUNT] = [
        JointId::Root,
        JointId::Waist,
        JointId::Torso,
        JointId::Neck,
        JointId::Head,
        JointId::LeftShoulder,
        JointId::LeftElbow,
        JointId::LeftHand,
        JointId::RightShoulder,
        JointId::RightElbow,
        JointId::RightHand,
        JointId::LeftHip,
        JointId::LeftKnee,
        JointId::LeftFoot,
        JointId::RightHip,
        JointId::RightKnee,
        JointId::RightFoot,
        JointId::Ground,
    ];

    /// 数组下标
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 点分键（与渲染层的资源绑定键一致）
    pub fn key(self) -> &'static str {
        match self {
            JointId::Root => "root",
            JointId::Waist => "waist",
            JointId::Torso => "torso",
            JointId::Neck => "neck",
            JointId::Head => "head",
            JointId::LeftShoulder => "left.shoulder",
            JointId::LeftElbow => "left.elbow",
            JointId::LeftHand => "left.hand",
            JointId::RightShoulder => "right.shoulder",
            JointId::RightElbow => "right.elbow",
            JointId::RightHand => "right.hand",
            JointId::LeftHip => "left.hip",
            JointId::LeftKnee => "left.knee",
            JointId::LeftFoot => "left.foot",
            JointId::RightHip => "right.hip",
            JointId::RightKnee => "right.knee",
            JointId::RightFoot => "right.foot",
            JointId::Ground => "ground",
        }
    }

    /// 所属侧（躯干关节为 None）
    pub fn side(self) -> Option<Side> {
        use JointId::*;
        match self {
            LeftShoulder | LeftElbow | LeftHand | LeftHip | LeftKnee | LeftFoot => Some(Side::Left),
            RightShoulder | RightElbow | RightHand | RightHip | RightKnee | RightFoot => {
                Some(Side::Right)
            }
            _ => None,
        }
    }

    pub fn flags(self) -> JointFlags {
        use JointId::*;
        match self {
            Root | Waist | Torso => JointFlags::CORE | JointFlags::SPIN_DAMPED,
            Neck => JointFlags::CORE,
            LeftHand | RightHand => JointFlags::HAND,
            LeftFoot | RightFoot => JointFlags::FOOT,
            Ground => JointFlags::SYNTHETIC,
            _ => JointFlags::empty(),
        }
    }

    #[inline]
    pub fn is_core(self) -> bool {
        self.flags().contains(JointFlags::CORE)
    }

    #[inline]
    pub fn is_extremity(self) -> bool {
        self.flags().intersects(JointFlags::EXTREMITY)
    }

    #[inline]
    pub fn is_foot(self) -> bool {
        self.flags().contains(JointFlags::FOOT)
    }

    #[inline]
    pub fn is_synthetic(self) -> bool {
        self.flags().contains(JointFlags::SYNTHETIC)
    }

    /// 父关节（root 与 ground 没有父节点）
    pub fn parent(self) -> Option<JointId> {
        BONES.iter().find(|bone| bone.child == self).map(|bone| bone.parent)
    }

    /// 直接子关节
    pub fn children(self) -> impl Iterator<Item = JointId> {
        BONES.iter().filter(move |bone| bone.parent == self).map(|bone| bone.child)
    }

    /// 以此关节为终点的骨骼
    pub fn bone(self) -> Option<&'static BoneDef> {
        BONES.iter().find(|bone| bone.child == self)
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for JointId {
    type Err = PuppetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointId::ALL
            .iter()
            .copied()
            .find(|joint| joint.key() == s)
            .ok_or_else(|| PuppetError::UnknownJoint(s.to_string()))
    }
}

// ============================================================================
// 骨骼边表
// ============================================================================

/// 一条父→子骨骼边
#[derive(Clone, Copy, Debug)]
pub struct BoneDef {
    pub parent: JointId,
    pub child: JointId,
    /// 骨骼长度
    pub length: f32,
    /// 骨骼宽度（命中检测与贴图绑定）
    pub width: f32,
    pub shape: BoneShape,
}

const fn bone(parent: JointId, child: JointId, length: f32, width: f32, shape: BoneShape) -> BoneDef {
    BoneDef { parent, child, length, width, shape }
}

/// 骨骼层级（拓扑序：父节点总是先于子节点出现）
///
/// waist 长于 torso，使两者中点位于 root 的"下方"（见 extract 的地面角推导）。
pub static BONES: [BoneDef; 16] = [
    bone(JointId::Root, JointId::Waist, 96.0, 50.0, BoneShape::Curve),
    bone(JointId::Root, JointId::Torso, 48.0, 76.0, BoneShape::Curve),
    bone(JointId::Torso, JointId::Neck, 10.0, 24.0, BoneShape::Curve),
    bone(JointId::Neck, JointId::Head, 64.0, 38.0, BoneShape::Circle),
    bone(JointId::Torso, JointId::LeftShoulder, 96.0, 24.0, BoneShape::Polygon),
    bone(JointId::LeftShoulder, JointId::LeftElbow, 96.0, 19.0, BoneShape::Polygon),
    bone(JointId::LeftElbow, JointId::LeftHand, 48.0, 10.0, BoneShape::Polygon),
    bone(JointId::Torso, JointId::RightShoulder, 96.0, 24.0, BoneShape::Polygon),
    bone(JointId::RightShoulder, JointId::RightElbow, 96.0, 19.0, BoneShape::Polygon),
    bone(JointId::RightElbow, JointId::RightHand, 48.0, 10.0, BoneShape::Polygon),
    bone(JointId::Waist, JointId::LeftHip, 112.0, 36.0, BoneShape::Polygon),
    bone(JointId::LeftHip, JointId::LeftKnee, 112.0, 26.0, BoneShape::Polygon),
    bone(JointId::LeftKnee, JointId::LeftFoot, 48.0, 16.0, BoneShape::Polygon),
    bone(JointId::Waist, JointId::RightHip, 112.0, 36.0, BoneShape::Polygon),
    bone(JointId::RightHip, JointId::RightKnee, 112.0, 26.0, BoneShape::Polygon),
    bone(JointId::RightKnee, JointId::RightFoot, 48.0, 16.0, BoneShape::Polygon),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for joint in JointId::ALL {
            assert_eq!(joint.key().parse::<JointId>().unwrap(), joint);
        }
        assert_eq!(JointId::LeftHip.to_string(), "left.hip");
    }

    #[test]
    fn test_unknown_key() {
        let err = "left.tail".parse::<JointId>().unwrap_err();
        assert!(matches!(err, PuppetError::UnknownJoint(ref key) if key == "left.tail"));
    }

    #[test]
    fn test_index_matches_all() {
        for (i, joint) in JointId::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
        }
    }

    #[test]
    fn test_hierarchy_is_tree() {
        // 除 root 与 ground 外每个关节恰好有一个父节点
        for joint in JointId::ALL {
            let parents = BONES.iter().filter(|b| b.child == joint).count();
            match joint {
                JointId::Root | JointId::Ground => assert_eq!(parents, 0),
                _ => assert_eq!(parents, 1, "{joint}"),
            }
        }
        assert!(BONES.iter().all(|b| !b.parent.is_synthetic() && !b.child.is_synthetic()));
    }

    #[test]
    fn test_topological_order() {
        for (i, b) in BONES.iter().enumerate() {
            if b.parent == JointId::Root {
                continue;
            }
            let parent_pos = BONES.iter().position(|p| p.child == b.parent).unwrap();
            assert!(parent_pos < i, "{} listed before its parent", b.child);
        }
    }

    #[test]
    fn test_children_and_sides() {
        let torso: Vec<_> = JointId::Torso.children().collect();
        assert_eq!(torso, vec![JointId::Neck, JointId::LeftShoulder, JointId::RightShoulder]);
        assert_eq!(JointId::LeftKnee.parent(), Some(JointId::LeftHip));
        assert_eq!(JointId::Root.parent(), None);
        assert_eq!(JointId::RightFoot.side(), Some(Side::Right));
        assert_eq!(JointId::Neck.side(), None);
    }

    #[test]
    fn test_flags() {
        assert!(JointId::Neck.is_core());
        assert!(!JointId::Neck.flags().contains(JointFlags::SPIN_DAMPED));
        assert!(JointId::LeftHand.is_extremity());
        assert!(JointId::RightFoot.is_foot());
        assert!(!JointId::LeftHand.is_foot());
        assert!(JointId::Ground.is_synthetic());
    }

    #[test]
    fn test_bone_shapes() {
        for b in BONES.iter() {
            let expected = match b.child {
                JointId::Head => BoneShape::Circle,
                JointId::Waist | JointId::Torso | JointId::Neck => BoneShape::Curve,
                _ => BoneShape::Polygon,
            };
            assert_eq!(b.shape, expected, "{}", b.child);
        }
    }
}
