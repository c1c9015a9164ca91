use crate::config::FramesConfig;
use crate::hand::{HandJoint, HandSnapshot, JointPose, Side};
use crate::kinematics::geometry::{inverse_transform_point, relative_rotation};
use crate::messages::{TfMessage, TransformStamped};

use super::convert::{write_pose, Convention};

pub const HEADSET_SLOT: usize = 0;
pub const LEFT_BASE_SLOT: usize = 1;
pub const RIGHT_BASE_SLOT: usize = 2;
/// ベースノード数 (headset, hand_left, hand_right)
pub const BASE_NODES: usize = 3;

/// 1 tick 分の入力
#[derive(Debug, Clone, Copy)]
pub struct TreeInput<'a> {
    pub headset: Option<JointPose>,
    pub left_anchor: Option<JointPose>,
    pub right_anchor: Option<JointPose>,
    pub left_hand: &'a HandSnapshot,
    pub right_hand: &'a HandSnapshot,
}

/// refresh で更新されたノード数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub headset: bool,
    pub left_joints: usize,
    pub right_joints: usize,
}

/// 事前確保した TF ノード配列
///
/// レイアウト: [headset, hand_left, hand_right, 左手関節..., 右手関節...]
/// ノード数とフレーム名は初期化後に変わらない。refresh は位置・回転だけを上書きする。
#[derive(Debug, Clone)]
pub struct TransformTree {
    convention: Convention,
    joints: Vec<HandJoint>,
    message: TfMessage,
}

impl TransformTree {
    /// `3 + 2 * joints.len()` ノードを確保し、フレーム名を一度だけ作る
    pub fn new(joints: &[HandJoint], frames: &FramesConfig, convention: Convention) -> Self {
        let mut transforms = Vec::with_capacity(BASE_NODES + 2 * joints.len());

        transforms.push(TransformStamped::new(frames.root.clone(), frames.headset.clone()));
        transforms.push(TransformStamped::new(frames.root.clone(), frames.hand_left.clone()));
        transforms.push(TransformStamped::new(frames.root.clone(), frames.hand_right.clone()));

        for hand_frame in [&frames.hand_left, &frames.hand_right] {
            for joint in joints {
                transforms.push(TransformStamped::new(
                    hand_frame.clone(),
                    joint_frame_name(hand_frame, *joint),
                ));
            }
        }

        Self {
            convention,
            joints: joints.to_vec(),
            message: TfMessage { transforms },
        }
    }

    /// 全 26 関節
    pub fn with_all_joints(frames: &FramesConfig, convention: Convention) -> Self {
        Self::new(&HandJoint::ALL, frames, convention)
    }

    pub fn len(&self) -> usize {
        self.message.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message.transforms.is_empty()
    }

    pub fn nodes(&self) -> &[TransformStamped] {
        &self.message.transforms
    }

    pub fn node(&self, slot: usize) -> Option<&TransformStamped> {
        self.message.transforms.get(slot)
    }

    pub fn message(&self) -> &TfMessage {
        &self.message
    }

    pub fn base_slot(side: Side) -> usize {
        match side {
            Side::Left => LEFT_BASE_SLOT,
            Side::Right => RIGHT_BASE_SLOT,
        }
    }

    /// 関節ノードのスロット番号
    pub fn slot_of(&self, side: Side, joint: HandJoint) -> Option<usize> {
        let i = self.joints.iter().position(|j| *j == joint)?;
        Some(self.hand_offset(side) + i)
    }

    fn hand_offset(&self, side: Side) -> usize {
        match side {
            Side::Left => BASE_NODES,
            Side::Right => BASE_NODES + self.joints.len(),
        }
    }

    /// 全ノードの位置・回転をその場で更新
    ///
    /// - headset: 姿勢があれば絶対姿勢
    /// - 手: アンカーがあり、かつトラッキング中のときだけベースと関節を更新。
    ///   関節はアンカー基準の相対姿勢。姿勢のない関節は前回値を保持
    /// - 非トラッキングの手はベース・関節とも前回値を保持
    pub fn refresh(&mut self, input: &TreeInput<'_>) -> RefreshStats {
        let mut stats = RefreshStats::default();
        let convention = self.convention;

        if let Some(headset) = input.headset {
            let node = &mut self.message.transforms[HEADSET_SLOT];
            write_pose(node, convention, &headset.position, &headset.rotation);
            stats.headset = true;
        }

        stats.left_joints = self.refresh_hand(Side::Left, input.left_anchor.as_ref(), input.left_hand);
        stats.right_joints =
            self.refresh_hand(Side::Right, input.right_anchor.as_ref(), input.right_hand);
        stats
    }

    fn refresh_hand(&mut self, side: Side, anchor: Option<&JointPose>, hand: &HandSnapshot) -> usize {
        let anchor = match anchor {
            Some(anchor) if hand.tracked => anchor,
            _ => return 0,
        };

        let convention = self.convention;
        let offset = self.hand_offset(side);
        let transforms = &mut self.message.transforms;

        write_pose(
            &mut transforms[Self::base_slot(side)],
            convention,
            &anchor.position,
            &anchor.rotation,
        );

        let mut updated = 0;
        for (i, joint) in self.joints.iter().enumerate() {
            let pose = match hand.get(*joint) {
                Some(pose) => pose,
                None => continue,
            };
            let position = inverse_transform_point(anchor, &pose.position);
            let rotation = relative_rotation(anchor, &pose.rotation);
            write_pose(&mut transforms[offset + i], convention, &position, &rotation);
            updated += 1;
        }
        updated
    }
}

/// `{hand_frame}/{snake_case(joint)}` 例: hand_left/index_proximal
pub fn joint_frame_name(hand_frame: &str, joint: HandJoint) -> String {
    format!("{}/{}", hand_frame, joint.snake_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::mapper::tests::full_hand;
    use nalgebra::{Quaternion, Vector3};

    fn frames() -> FramesConfig {
        FramesConfig::default()
    }

    fn anchor_at(x: f32, y: f32, z: f32) -> JointPose {
        JointPose::at(Vector3::new(x, y, z))
    }

    fn input<'a>(left: &'a HandSnapshot, right: &'a HandSnapshot) -> TreeInput<'a> {
        TreeInput {
            headset: Some(anchor_at(0.0, 1.6, 0.0)),
            left_anchor: Some(anchor_at(-0.2, 1.2, 0.3)),
            right_anchor: Some(anchor_at(0.2, 1.2, 0.3)),
            left_hand: left,
            right_hand: right,
        }
    }

    #[test]
    fn test_node_count_and_names() {
        let tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        assert_eq!(tree.len(), 3 + 2 * HandJoint::COUNT);

        assert_eq!(tree.node(HEADSET_SLOT).unwrap().parent_frame(), "vr_world");
        assert_eq!(tree.node(HEADSET_SLOT).unwrap().child_frame(), "hmd");
        assert_eq!(tree.node(LEFT_BASE_SLOT).unwrap().child_frame(), "hand_left");
        assert_eq!(tree.node(RIGHT_BASE_SLOT).unwrap().child_frame(), "hand_right");

        let slot = tree.slot_of(Side::Left, HandJoint::IndexProximal).unwrap();
        let node = tree.node(slot).unwrap();
        assert_eq!(node.parent_frame(), "hand_left");
        assert_eq!(node.child_frame(), "hand_left/index_proximal");

        let slot = tree.slot_of(Side::Right, HandJoint::Wrist).unwrap();
        assert_eq!(slot, 3 + HandJoint::COUNT);
        assert_eq!(tree.node(slot).unwrap().child_frame(), "hand_right/wrist");
    }

    #[test]
    fn test_subset_of_joints() {
        let joints = [HandJoint::Wrist, HandJoint::IndexTip];
        let tree = TransformTree::new(&joints, &frames(), Convention::Ruf);
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.slot_of(Side::Left, HandJoint::Palm), None);
        assert_eq!(tree.slot_of(Side::Right, HandJoint::IndexTip), Some(6));
    }

    #[test]
    fn test_refresh_writes_relative_pose() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let mut left = HandSnapshot::tracked();
        // アンカーの 10cm 前方 (Unity +Z)
        left.set(HandJoint::Wrist, anchor_at(-0.2, 1.2, 0.4));
        let right = HandSnapshot::untracked();

        let stats = tree.refresh(&input(&left, &right));
        assert!(stats.headset);
        assert_eq!(stats.left_joints, 1);
        assert_eq!(stats.right_joints, 0);

        let slot = tree.slot_of(Side::Left, HandJoint::Wrist).unwrap();
        let node = tree.node(slot).unwrap();
        // FLU で +X (前方) に 0.1
        assert!((node.translation[0] - 0.1).abs() < 1e-5);
        assert!(node.translation[1].abs() < 1e-6);
        assert!(node.translation[2].abs() < 1e-6);

        let headset = tree.node(HEADSET_SLOT).unwrap();
        assert!((headset.translation[2] - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_untracked_hand_keeps_last_known_good() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let left = full_hand();
        let right = full_hand();
        tree.refresh(&input(&left, &right));
        let before: Vec<TransformStamped> = tree.nodes().to_vec();

        let mut lost = full_hand();
        lost.tracked = false;
        // 姿勢自体も変えておき、使われていないことを確認
        lost.set(HandJoint::IndexTip, anchor_at(5.0, 5.0, 5.0));
        let mut moved = input(&left, &lost);
        moved.right_anchor = Some(anchor_at(1.0, 1.0, 1.0));
        let stats = tree.refresh(&moved);
        assert_eq!(stats.right_joints, 0);

        for joint in HandJoint::ALL {
            let slot = tree.slot_of(Side::Right, joint).unwrap();
            assert_eq!(tree.node(slot), Some(&before[slot]), "{:?}", joint);
        }
        assert_eq!(tree.node(RIGHT_BASE_SLOT), Some(&before[RIGHT_BASE_SLOT]));
    }

    #[test]
    fn test_missing_joint_keeps_previous_value() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let left = full_hand();
        let right = HandSnapshot::untracked();
        tree.refresh(&input(&left, &right));
        let slot = tree.slot_of(Side::Left, HandJoint::ThumbTip).unwrap();
        let before = tree.node(slot).cloned();

        let partial = full_hand().without_joint(HandJoint::ThumbTip);
        let stats = tree.refresh(&input(&partial, &right));
        assert_eq!(stats.left_joints, HandJoint::COUNT - 1);
        assert_eq!(tree.node(slot).cloned(), before);
    }

    #[test]
    fn test_missing_anchor_skips_hand() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let left = full_hand();
        let right = full_hand();
        let mut no_anchor = input(&left, &right);
        no_anchor.left_anchor = None;
        let stats = tree.refresh(&no_anchor);
        assert_eq!(stats.left_joints, 0);
        assert_eq!(stats.right_joints, HandJoint::COUNT);
    }

    #[test]
    fn test_zero_rotation_repaired_in_node() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let left = HandSnapshot::untracked();
        let right = HandSnapshot::untracked();
        let mut zero_headset = input(&left, &right);
        zero_headset.headset = Some(JointPose::new(
            Vector3::new(0.0, 1.5, 0.0),
            Quaternion::new(0.0, 0.0, 0.0, 0.0),
        ));
        tree.refresh(&zero_headset);
        assert_eq!(tree.node(HEADSET_SLOT).unwrap().rotation, [0.0, 0.0, 0.0, 1.0]);

        // 関節の回転が全 0 でも相対回転は全 0 になり、単位回転へ補正される
        let mut hand = HandSnapshot::tracked();
        hand.set(
            HandJoint::Palm,
            JointPose::new(Vector3::new(-0.2, 1.2, 0.35), Quaternion::new(0.0, 0.0, 0.0, 0.0)),
        );
        tree.refresh(&input(&hand, &right));
        let slot = tree.slot_of(Side::Left, HandJoint::Palm).unwrap();
        assert_eq!(tree.node(slot).unwrap().rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_refresh_does_not_grow_or_rename() {
        let mut tree = TransformTree::with_all_joints(&frames(), Convention::Ruf);
        let names: Vec<(String, String)> = tree
            .nodes()
            .iter()
            .map(|n| (n.parent_frame().to_string(), n.child_frame().to_string()))
            .collect();
        let capacity = tree.message().transforms.capacity();

        let left = full_hand();
        let right = full_hand();
        for _ in 0..5 {
            tree.refresh(&input(&left, &right));
        }

        assert_eq!(tree.len(), names.len());
        assert_eq!(tree.message().transforms.capacity(), capacity);
        for (node, (parent, child)) in tree.nodes().iter().zip(names.iter()) {
            assert_eq!(node.parent_frame(), parent);
            assert_eq!(node.child_frame(), child);
        }
    }
}
