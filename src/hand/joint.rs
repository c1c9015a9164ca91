use serde::{Deserialize, Serialize};

/// 手の左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// 関節名のプレフィックス ("left" / "right")
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// 左右ごとの配列の添字 (left: 0, right: 1)
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// ハンドトラッキングの 26 関節 (トラッキングソースの並び順)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum HandJoint {
    Wrist = 0,
    Palm = 1,
    ThumbMetacarpal = 2,
    ThumbProximal = 3,
    ThumbDistal = 4,
    ThumbTip = 5,
    IndexMetacarpal = 6,
    IndexProximal = 7,
    IndexIntermediate = 8,
    IndexDistal = 9,
    IndexTip = 10,
    MiddleMetacarpal = 11,
    MiddleProximal = 12,
    MiddleIntermediate = 13,
    MiddleDistal = 14,
    MiddleTip = 15,
    RingMetacarpal = 16,
    RingProximal = 17,
    RingIntermediate = 18,
    RingDistal = 19,
    RingTip = 20,
    LittleMetacarpal = 21,
    LittleProximal = 22,
    LittleIntermediate = 23,
    LittleDistal = 24,
    LittleTip = 25,
}

impl HandJoint {
    pub const COUNT: usize = 26;

    pub const ALL: [HandJoint; HandJoint::COUNT] = [
        HandJoint::Wrist,
        HandJoint::Palm,
        HandJoint::ThumbMetacarpal,
        HandJoint::ThumbProximal,
        HandJoint::ThumbDistal,
        HandJoint::ThumbTip,
        HandJoint::IndexMetacarpal,
        HandJoint::IndexProximal,
        HandJoint::IndexIntermediate,
        HandJoint::IndexDistal,
        HandJoint::IndexTip,
        HandJoint::MiddleMetacarpal,
        HandJoint::MiddleProximal,
        HandJoint::MiddleIntermediate,
        HandJoint::MiddleDistal,
        HandJoint::MiddleTip,
        HandJoint::RingMetacarpal,
        HandJoint::RingProximal,
        HandJoint::RingIntermediate,
        HandJoint::RingDistal,
        HandJoint::RingTip,
        HandJoint::LittleMetacarpal,
        HandJoint::LittleProximal,
        HandJoint::LittleIntermediate,
        HandJoint::LittleDistal,
        HandJoint::LittleTip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// フレーム名に使う snake_case 名 (例: IndexProximal -> "index_proximal")
    pub fn snake_name(self) -> &'static str {
        match self {
            HandJoint::Wrist => "wrist",
            HandJoint::Palm => "palm",
            HandJoint::ThumbMetacarpal => "thumb_metacarpal",
            HandJoint::ThumbProximal => "thumb_proximal",
            HandJoint::ThumbDistal => "thumb_distal",
            HandJoint::ThumbTip => "thumb_tip",
            HandJoint::IndexMetacarpal => "index_metacarpal",
            HandJoint::IndexProximal => "index_proximal",
            HandJoint::IndexIntermediate => "index_intermediate",
            HandJoint::IndexDistal => "index_distal",
            HandJoint::IndexTip => "index_tip",
            HandJoint::MiddleMetacarpal => "middle_metacarpal",
            HandJoint::MiddleProximal => "middle_proximal",
            HandJoint::MiddleIntermediate => "middle_intermediate",
            HandJoint::MiddleDistal => "middle_distal",
            HandJoint::MiddleTip => "middle_tip",
            HandJoint::RingMetacarpal => "ring_metacarpal",
            HandJoint::RingProximal => "ring_proximal",
            HandJoint::RingIntermediate => "ring_intermediate",
            HandJoint::RingDistal => "ring_distal",
            HandJoint::RingTip => "ring_tip",
            HandJoint::LittleMetacarpal => "little_metacarpal",
            HandJoint::LittleProximal => "little_proximal",
            HandJoint::LittleIntermediate => "little_intermediate",
            HandJoint::LittleDistal => "little_distal",
            HandJoint::LittleTip => "little_tip",
        }
    }
}
