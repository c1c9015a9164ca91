use nalgebra::{UnitQuaternion, Vector3};
use std::f32::consts::PI;
use std::f64::consts::TAU;

use crate::hand::{HandJoint, HandSnapshot, JointPose, Side};

use super::TrackingSource;

/// 握る/開くの周期（秒）
const CURL_PERIOD: f64 = 2.0;
/// 右手がトラッキングを失う周期と長さ（秒）
const DROPOUT_PERIOD: f64 = 10.0;
const DROPOUT_LENGTH: f64 = 1.0;
/// 左手のひらを顔に向ける（手首メニューを見る）周期と長さ（秒）
const LOOK_PERIOD: f64 = 6.0;
const LOOK_LENGTH: f64 = 3.0;
/// 完全に握ったときの各関節の曲げ角（ラジアン）
const MAX_BEND: [f32; 3] = [1.3, 1.5, 0.9];

/// (metacarpal, x オフセット, 各ボーン長: proximal, intermediate, distal)
const FINGER_LAYOUT: [(HandJoint, f32, [f32; 3]); 4] = [
    (HandJoint::IndexMetacarpal, 0.02, [0.04, 0.025, 0.02]),
    (HandJoint::MiddleMetacarpal, 0.0, [0.045, 0.028, 0.02]),
    (HandJoint::RingMetacarpal, -0.02, [0.042, 0.026, 0.019]),
    (HandJoint::LittleMetacarpal, -0.035, [0.033, 0.02, 0.017]),
];

/// デモ用の人工トラッキング
///
/// アンカーは固定、指は周期的に握って開く。右手は一定周期で一時的にロストし、
/// 左手は一定周期で手のひらを上へ返す。
pub struct SyntheticSource {
    headset: JointPose,
    anchors: [JointPose; 2],
    hands: [HandSnapshot; 2],
    dropout: bool,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            headset: JointPose::at(Vector3::new(0.0, 1.6, 0.0)),
            anchors: [
                JointPose::at(Vector3::new(-0.2, 1.2, 0.3)),
                JointPose::at(Vector3::new(0.2, 1.2, 0.3)),
            ],
            hands: [HandSnapshot::untracked(), HandSnapshot::untracked()],
            dropout: true,
        }
    }

    /// 右手のロストを無効化
    pub fn without_dropout(mut self) -> Self {
        self.dropout = false;
        self
    }

    /// 左手のひらが上を向いている時間帯か
    pub fn looking_at_wrist(now: f64) -> bool {
        now.rem_euclid(LOOK_PERIOD) >= LOOK_PERIOD - LOOK_LENGTH
    }

    /// 0 (開き) .. 1 (握り)
    pub fn curl_at(now: f64) -> f32 {
        (0.5 - 0.5 * (TAU * now / CURL_PERIOD).cos()) as f32
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

/// 曲げ角 theta の指方向（+Z から -Y へ倒れる）
fn bone_direction(theta: f32) -> Vector3<f32> {
    Vector3::new(0.0, -theta.sin(), theta.cos())
}

/// アンカー基準で手のポーズを書き込む。左手は X を反転
fn pose_hand(hand: &mut HandSnapshot, anchor: &JointPose, mirror: f32, curl: f32) {
    hand.clear(true);
    let mut put = |joint: HandJoint, local: Vector3<f32>| {
        let p = Vector3::new(local.x * mirror, local.y, local.z);
        hand.set(joint, JointPose::at(anchor.position + p));
    };

    put(HandJoint::Wrist, Vector3::new(0.0, 0.0, -0.04));
    put(HandJoint::Palm, Vector3::new(0.0, -0.01, 0.0));

    for (meta, x, lengths) in FINGER_LAYOUT {
        let base = meta.index();
        let metacarpal = Vector3::new(x, 0.0, -0.03);
        let mut joint = Vector3::new(x, 0.0, 0.03);
        put(HandJoint::ALL[base], metacarpal);
        put(HandJoint::ALL[base + 1], joint);

        let mut theta = 0.0;
        for (i, length) in lengths.iter().enumerate() {
            theta += curl * MAX_BEND[i];
            joint += bone_direction(theta) * *length;
            put(HandJoint::ALL[base + 2 + i], joint);
        }
    }

    // 親指は手のひら側へ小さく曲げる
    let thumb_bend = 0.3 + 0.6 * curl;
    put(HandJoint::ThumbMetacarpal, Vector3::new(0.02, 0.0, -0.03));
    put(HandJoint::ThumbProximal, Vector3::new(0.035, 0.0, -0.01));
    let distal = Vector3::new(0.045, 0.0, -0.01) + bone_direction(thumb_bend) * 0.02;
    put(HandJoint::ThumbDistal, distal);
    put(HandJoint::ThumbTip, distal + bone_direction(2.0 * thumb_bend) * 0.015);
}

impl TrackingSource for SyntheticSource {
    fn advance(&mut self, now: f64) {
        let curl = Self::curl_at(now);
        let lost = self.dropout && now.rem_euclid(DROPOUT_PERIOD) >= DROPOUT_PERIOD - DROPOUT_LENGTH;

        for side in Side::BOTH {
            let slot = side.index();
            let mirror = match side {
                Side::Left => -1.0,
                Side::Right => 1.0,
            };
            if side == Side::Right && lost {
                // 姿勢は古いまま、tracked だけ落とす
                self.hands[slot].tracked = false;
                continue;
            }
            let hand = &mut self.hands[slot];
            pose_hand(hand, &self.anchors[slot], mirror, curl);

            if side == Side::Left && Self::looking_at_wrist(now) {
                if let Some(palm) = hand.get(HandJoint::Palm).copied() {
                    let palm_up = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI);
                    hand.set(HandJoint::Palm, JointPose::new(palm.position, palm_up.into_inner()));
                }
            }
        }
    }

    fn headset_pose(&self) -> Option<JointPose> {
        Some(self.headset)
    }

    fn hand_anchor(&self, side: Side) -> Option<JointPose> {
        Some(self.anchors[side.index()])
    }

    fn hand(&self, side: Side) -> &HandSnapshot {
        &self.hands[side.index()]
    }
}
