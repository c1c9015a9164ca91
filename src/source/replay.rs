use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::SourceError;
use crate::hand::{HandJoint, HandSnapshot, JointPose, Side};

use super::TrackingSource;

/// 記録ファイル中の姿勢。rotation は (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub position: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl From<PoseRecord> for JointPose {
    fn from(record: PoseRecord) -> Self {
        JointPose::from_arrays(record.position, record.rotation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    #[serde(default)]
    pub tracked: bool,
    #[serde(default)]
    pub anchor: Option<PoseRecord>,
    #[serde(default)]
    pub joints: HashMap<HandJoint, PoseRecord>,
}

/// JSON Lines の 1 行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// 記録開始からの秒数
    pub t: f64,
    #[serde(default)]
    pub headset: Option<PoseRecord>,
    #[serde(default)]
    pub left: HandRecord,
    #[serde(default)]
    pub right: HandRecord,
}

/// JSON Lines を 1 行ずつパース。空行は無視
pub fn parse_frames(content: &str) -> Result<Vec<FrameRecord>, SourceError> {
    let mut frames = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame = serde_json::from_str(line).map_err(|source| SourceError::Parse {
            line: i + 1,
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// 記録済みフレームの再生
pub struct ReplaySource {
    frames: Vec<FrameRecord>,
    looping: bool,
    duration: f64,
    start: Option<f64>,
    cursor: usize,
    finished: bool,
    headset: Option<JointPose>,
    anchors: [Option<JointPose>; 2],
    hands: [HandSnapshot; 2],
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(path: P, looping: bool) -> Result<Self, SourceError> {
        let path_str = path.as_ref().display().to_string();
        let content = fs::read_to_string(path.as_ref()).map_err(|source| SourceError::Open {
            path: path_str.clone(),
            source,
        })?;
        let frames = parse_frames(&content)?;
        if frames.is_empty() {
            return Err(SourceError::Empty(path_str));
        }
        tracing::info!(path = %path_str, frames = frames.len(), looping, "loaded recording");
        Ok(Self::from_frames(frames, looping))
    }

    /// frames は空でないこと（空なら何も再生しない）
    pub fn from_frames(mut frames: Vec<FrameRecord>, looping: bool) -> Self {
        frames.sort_by(|a, b| a.t.total_cmp(&b.t));
        let duration = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        };
        Self {
            frames,
            looping,
            duration,
            start: None,
            cursor: 0,
            finished: false,
            headset: None,
            anchors: [None, None],
            hands: [HandSnapshot::untracked(), HandSnapshot::untracked()],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 現在適用されているフレーム番号
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 経過時間に対応するフレーム (t <= elapsed の最後のもの)
    fn frame_index_at(&self, elapsed: f64) -> usize {
        let origin = self.frames.first().map_or(0.0, |f| f.t);
        let target = origin + elapsed;
        match self.frames.iter().rposition(|f| f.t <= target) {
            Some(i) => i,
            None => 0,
        }
    }

    fn apply(&mut self, index: usize) {
        let frame = match self.frames.get(index) {
            Some(frame) => frame,
            None => return,
        };
        self.headset = frame.headset.map(JointPose::from);
        for (slot, record) in [&frame.left, &frame.right].into_iter().enumerate() {
            self.anchors[slot] = record.anchor.map(JointPose::from);
            let hand = &mut self.hands[slot];
            hand.clear(record.tracked);
            for (joint, pose) in &record.joints {
                hand.set(*joint, JointPose::from(*pose));
            }
        }
        self.cursor = index;
    }
}

impl TrackingSource for ReplaySource {
    fn advance(&mut self, now: f64) {
        if self.frames.is_empty() {
            self.finished = true;
            return;
        }
        let start = *self.start.get_or_insert(now);
        let mut elapsed = (now - start).max(0.0);

        if elapsed > self.duration {
            if self.looping && self.duration > 0.0 {
                elapsed %= self.duration;
            } else if !self.looping && !self.finished {
                self.finished = true;
                tracing::info!("recording finished");
            }
        }

        let index = self.frame_index_at(elapsed);
        if index != self.cursor || self.start == Some(now) {
            self.apply(index);
        }
    }

    fn headset_pose(&self) -> Option<JointPose> {
        self.headset
    }

    fn hand_anchor(&self, side: Side) -> Option<JointPose> {
        self.anchors[side.index()]
    }

    fn hand(&self, side: Side) -> &HandSnapshot {
        &self.hands[side.index()]
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
