use nalgebra::{Quaternion, Vector3};

use super::joint::HandJoint;

/// 関節・アンカー・HMD の位置と回転 (トラッキングソースの座標系)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub position: Vector3<f32>,
    /// 未初期化のソースでは全成分 0 になり得る
    pub rotation: Quaternion<f32>,
}

impl JointPose {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// 配列から作成。rotation は (x, y, z, w)
    pub fn from_arrays(position: [f32; 3], rotation: [f32; 4]) -> Self {
        Self {
            position: Vector3::new(position[0], position[1], position[2]),
            rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        }
    }

    pub fn at(position: Vector3<f32>) -> Self {
        Self::new(position, Quaternion::identity())
    }

    /// 原点、回転なし
    pub fn identity() -> Self {
        Self::at(Vector3::zeros())
    }
}

/// 1 フレーム分の片手の関節スナップショット
///
/// トラッキングソースが毎フレーム上書きする。パイプラインは参照だけを借りる。
#[derive(Debug, Clone, PartialEq)]
pub struct HandSnapshot {
    pub tracked: bool,
    joints: [Option<JointPose>; HandJoint::COUNT],
}

impl HandSnapshot {
    /// 関節なし・非トラッキング
    pub fn untracked() -> Self {
        Self {
            tracked: false,
            joints: [None; HandJoint::COUNT],
        }
    }

    pub fn tracked() -> Self {
        Self {
            tracked: true,
            ..Self::untracked()
        }
    }

    pub fn get(&self, joint: HandJoint) -> Option<&JointPose> {
        self.joints[joint.index()].as_ref()
    }

    pub fn position(&self, joint: HandJoint) -> Option<Vector3<f32>> {
        self.get(joint).map(|p| p.position)
    }

    pub fn set(&mut self, joint: HandJoint, pose: JointPose) {
        self.joints[joint.index()] = Some(pose);
    }

    pub fn remove(&mut self, joint: HandJoint) {
        self.joints[joint.index()] = None;
    }

    pub fn with_joint(mut self, joint: HandJoint, pose: JointPose) -> Self {
        self.set(joint, pose);
        self
    }

    pub fn without_joint(mut self, joint: HandJoint) -> Self {
        self.remove(joint);
        self
    }

    /// 全関節をクリアし、トラッキング状態を設定
    pub fn clear(&mut self, tracked: bool) {
        self.tracked = tracked;
        self.joints = [None; HandJoint::COUNT];
    }

    pub fn joint_count(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }
}

impl Default for HandSnapshot {
    fn default() -> Self {
        Self::untracked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arrays_quaternion_order() {
        let pose = JointPose::from_arrays([1.0, 2.0, 3.0], [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(pose.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.rotation.i, 0.1);
        assert_eq!(pose.rotation.j, 0.2);
        assert_eq!(pose.rotation.k, 0.3);
        assert_eq!(pose.rotation.w, 0.9);
    }

    #[test]
    fn test_snapshot_get_set() {
        let pose = JointPose::at(Vector3::new(0.0, 0.1, 0.0));
        let mut hand = HandSnapshot::tracked().with_joint(HandJoint::Palm, pose);
        assert!(hand.tracked);
        assert_eq!(hand.get(HandJoint::Palm), Some(&pose));
        assert_eq!(hand.get(HandJoint::Wrist), None);
        assert_eq!(hand.joint_count(), 1);

        hand.remove(HandJoint::Palm);
        assert_eq!(hand.joint_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut hand = HandSnapshot::tracked().with_joint(HandJoint::Wrist, JointPose::identity());
        hand.clear(false);
        assert!(!hand.tracked);
        assert_eq!(hand.joint_count(), 0);
    }
}
