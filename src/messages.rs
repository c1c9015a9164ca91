//! トランスポートに渡す送信レコード
//!
//! バッファはパイプラインが所有してティックをまたいで使い回す。
//! トランスポートは publish の間だけ借用する。

use crate::kinematics::AngleVector;

/// トピック登録時のメッセージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    JointState,
    Tf,
    PoseStamped,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::JointState => "sensor_msgs/JointState",
            MessageKind::Tf => "tf2_msgs/TFMessage",
            MessageKind::PoseStamped => "geometry_msgs/PoseStamped",
        }
    }
}

/// 関節角を name/position/velocity/effort 形式にしたもの
/// velocity と effort は常に空
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointStateMessage {
    pub name: Vec<&'static str>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

impl JointStateMessage {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name: Vec::with_capacity(capacity),
            position: Vec::with_capacity(capacity),
            velocity: Vec::new(),
            effort: Vec::new(),
        }
    }

    /// 角度ベクトルで上書き（確保済みの容量はそのまま）
    pub fn fill_from(&mut self, angles: &AngleVector) {
        self.name.clear();
        self.position.clear();
        self.velocity.clear();
        self.effort.clear();
        for entry in angles.iter() {
            self.name.push(entry.name);
            self.position.push(entry.angle as f64);
        }
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// 変換ツリーの親→子 1 本分 (FLU)
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStamped {
    parent_frame: String,
    child_frame: String,
    pub translation: [f64; 3],
    /// x, y, z, w
    pub rotation: [f64; 4],
}

impl TransformStamped {
    pub fn new(parent_frame: String, child_frame: String) -> Self {
        Self {
            parent_frame,
            child_frame,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn parent_frame(&self) -> &str {
        &self.parent_frame
    }

    pub fn child_frame(&self) -> &str {
        &self.child_frame
    }
}

/// TF トピックに送る変換の一覧
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TfMessage {
    pub transforms: Vec<TransformStamped>,
}

/// 時刻付きの単一姿勢（ヘッドセット用）
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStampedMessage {
    pub frame_id: String,
    pub position: [f64; 3],
    /// x, y, z, w
    pub orientation: [f64; 4],
}

impl PoseStampedMessage {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// [`crate::transport::Transport::publish`] に渡す借用ビュー
#[derive(Debug, Clone, Copy)]
pub enum Message<'a> {
    JointState(&'a JointStateMessage),
    Tf(&'a TfMessage),
    PoseStamped(&'a PoseStampedMessage),
}

impl Message<'_> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::JointState(_) => MessageKind::JointState,
            Message::Tf(_) => MessageKind::Tf,
            Message::PoseStamped(_) => MessageKind::PoseStamped,
        }
    }

    pub fn to_owned(&self) -> OwnedMessage {
        match self {
            Message::JointState(m) => OwnedMessage::JointState((*m).clone()),
            Message::Tf(m) => OwnedMessage::Tf((*m).clone()),
            Message::PoseStamped(m) => OwnedMessage::PoseStamped((*m).clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OwnedMessage {
    JointState(JointStateMessage),
    Tf(TfMessage),
    PoseStamped(PoseStampedMessage),
}
