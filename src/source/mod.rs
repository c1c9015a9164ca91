//! パイプラインへのトラッキング入力
//!
//! 手ごとのスナップショットはソースが所有し `advance` で上書きする。
//! パイプラインはティックの間だけ借用する。

pub mod replay;
pub mod synthetic;

use crate::config::{SourceConfig, SourceKind};
use crate::error::SourceError;
use crate::hand::{HandSnapshot, JointPose, Side};

pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

pub trait TrackingSource {
    /// ホスト時刻 `now`（秒）のフレームを取り込む
    fn advance(&mut self, now: f64);

    fn headset_pose(&self) -> Option<JointPose>;

    /// トラッキング空間での手のアンカー。取れないときは `None`
    fn hand_anchor(&self, side: Side) -> Option<JointPose>;

    fn hand(&self, side: Side) -> &HandSnapshot;

    /// ループしないソースがフレームを使い切ったら true
    fn is_finished(&self) -> bool {
        false
    }
}

pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn TrackingSource>, SourceError> {
    match config.kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new())),
        SourceKind::Replay => Ok(Box::new(ReplaySource::open(
            &config.replay_path,
            config.loop_replay,
        )?)),
    }
}
