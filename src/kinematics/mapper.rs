use nalgebra::Vector3;

use crate::config::{MapperConfig, MapperKind};
use crate::hand::{HandJoint, HandSnapshot, Side};

use super::geometry::{estimate_palm_normal, try_signed_flexion_angle};

/// 名前付きの関節角（ラジアン）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngle {
    pub name: &'static str,
    pub angle: f32,
}

/// 片手分の関節角ベクトル。名前の順序は固定だが、欠損した指は含まれない
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleVector {
    entries: Vec<JointAngle>,
}

impl AngleVector {
    /// 片手の最大エントリ数 (4指 x 3 + 親指 x 3)
    pub const MAX_ENTRIES: usize = 15;

    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(Self::MAX_ENTRIES),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, name: &'static str, angle: f32) {
        self.entries.push(JointAngle { name, angle });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[JointAngle] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointAngle> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.angle)
    }
}

/// 片手のスナップショットを関節角ベクトルへ変換するもの
pub trait SkeletonMapper {
    /// `out` をクリアしてから書き込む
    fn map_hand(&self, hand: &HandSnapshot, side: Side, out: &mut AngleVector);

    fn map(&self, hand: &HandSnapshot, side: Side) -> AngleVector {
        let mut out = AngleVector::new();
        self.map_hand(hand, side, &mut out);
        out
    }
}

/// 設定からマッパーを選択。"none" なら None
pub fn mapper_from_config(config: &MapperConfig) -> Option<Box<dyn SkeletonMapper>> {
    match config.kind {
        MapperKind::Flexion => Some(Box::new(FlexionMapper::from_config(config))),
        MapperKind::None => None,
    }
}

struct FingerChain {
    /// metacarpal, proximal, intermediate, distal, tip
    joints: [HandJoint; 5],
    /// [left, right] x [joint1, joint2, joint3]
    names: [[&'static str; 3]; 2],
}

const FINGERS: [FingerChain; 4] = [
    FingerChain {
        joints: [
            HandJoint::IndexMetacarpal,
            HandJoint::IndexProximal,
            HandJoint::IndexIntermediate,
            HandJoint::IndexDistal,
            HandJoint::IndexTip,
        ],
        names: [
            ["left_index_joint1", "left_index_joint2", "left_index_joint3"],
            ["right_index_joint1", "right_index_joint2", "right_index_joint3"],
        ],
    },
    FingerChain {
        joints: [
            HandJoint::MiddleMetacarpal,
            HandJoint::MiddleProximal,
            HandJoint::MiddleIntermediate,
            HandJoint::MiddleDistal,
            HandJoint::MiddleTip,
        ],
        names: [
            ["left_middle_joint1", "left_middle_joint2", "left_middle_joint3"],
            ["right_middle_joint1", "right_middle_joint2", "right_middle_joint3"],
        ],
    },
    FingerChain {
        joints: [
            HandJoint::RingMetacarpal,
            HandJoint::RingProximal,
            HandJoint::RingIntermediate,
            HandJoint::RingDistal,
            HandJoint::RingTip,
        ],
        names: [
            ["left_ring_joint1", "left_ring_joint2", "left_ring_joint3"],
            ["right_ring_joint1", "right_ring_joint2", "right_ring_joint3"],
        ],
    },
    // ロボットハンド側の命名に合わせて小指は "baby"
    FingerChain {
        joints: [
            HandJoint::LittleMetacarpal,
            HandJoint::LittleProximal,
            HandJoint::LittleIntermediate,
            HandJoint::LittleDistal,
            HandJoint::LittleTip,
        ],
        names: [
            ["left_baby_joint1", "left_baby_joint2", "left_baby_joint3"],
            ["right_baby_joint1", "right_baby_joint2", "right_baby_joint3"],
        ],
    },
];

/// metacarpal, proximal, distal, tip
const THUMB_JOINTS: [HandJoint; 4] = [
    HandJoint::ThumbMetacarpal,
    HandJoint::ThumbProximal,
    HandJoint::ThumbDistal,
    HandJoint::ThumbTip,
];

const THUMB_NAMES: [[&str; 3]; 2] = [
    ["left_thumb_joint1", "left_thumb_joint2", "left_thumb_joint3"],
    ["right_thumb_joint1", "right_thumb_joint2", "right_thumb_joint3"],
];

/// 手のひら法線を基準にした符号付き屈曲角マッパー
///
/// - 4指: 5関節すべて揃っている指だけ 3 角度を出力
/// - 親指: 4関節揃っていれば joint1, joint2 と予約の joint3 (= 0.0)
/// - 長さ 0 のボーンを含む角度はその角度だけ出力しない
#[derive(Debug, Clone)]
pub struct FlexionMapper {
    thumb_placeholder: bool,
}

impl FlexionMapper {
    pub fn new(thumb_placeholder: bool) -> Self {
        Self { thumb_placeholder }
    }

    pub fn from_config(config: &MapperConfig) -> Self {
        Self::new(config.thumb_placeholder)
    }

    fn map_finger(
        finger: &FingerChain,
        hand: &HandSnapshot,
        slot: usize,
        normal: &Vector3<f32>,
        out: &mut AngleVector,
    ) {
        let mut p = [Vector3::zeros(); 5];
        for (dst, joint) in p.iter_mut().zip(finger.joints.iter()) {
            match hand.position(*joint) {
                Some(pos) => *dst = pos,
                None => return,
            }
        }

        let names = &finger.names[slot];
        for i in 0..3 {
            if let Some(angle) = try_signed_flexion_angle(&p[i], &p[i + 1], &p[i + 2], normal) {
                out.push(names[i], angle);
            }
        }
    }

    fn map_thumb(&self, hand: &HandSnapshot, slot: usize, normal: &Vector3<f32>, out: &mut AngleVector) {
        let mut p = [Vector3::zeros(); 4];
        for (dst, joint) in p.iter_mut().zip(THUMB_JOINTS.iter()) {
            match hand.position(*joint) {
                Some(pos) => *dst = pos,
                None => return,
            }
        }

        let names = &THUMB_NAMES[slot];
        for i in 0..2 {
            if let Some(angle) = try_signed_flexion_angle(&p[i], &p[i + 1], &p[i + 2], normal) {
                out.push(names[i], angle);
            }
        }
        if self.thumb_placeholder {
            // 外転・内転の推定値が入るまでの予約枠
            out.push(names[2], 0.0);
        }
    }
}

impl Default for FlexionMapper {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SkeletonMapper for FlexionMapper {
    fn map_hand(&self, hand: &HandSnapshot, side: Side, out: &mut AngleVector) {
        out.clear();
        let normal = estimate_palm_normal(hand);
        let slot = side.index();

        for finger in &FINGERS {
            Self::map_finger(finger, hand, slot, &normal, out);
        }
        self.map_thumb(hand, slot, &normal, out);
    }
}
