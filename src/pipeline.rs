//! ソース → スケジューラ → ツリー/関節角 → トランスポート をつなぐ 1 ティック分の処理
//!
//! メッセージのバッファは [`Pipeline::new`] で確保し、以降は上書きするだけ。
//! 定常状態のティックではコンテナの伸長もフレーム名の生成もしない。

use nalgebra::{Quaternion, UnitQuaternion};

use crate::config::{Config, HeadsetPoseConfig};
use crate::error::TransportError;
use crate::hand::Side;
use crate::kinematics::{mapper_from_config, AngleVector, SkeletonMapper};
use crate::messages::{JointStateMessage, Message, MessageKind, PoseStampedMessage};
use crate::scheduler::PublishScheduler;
use crate::source::TrackingSource;
use crate::tf::{to_flu_rotation, to_flu_translation, Convention, RefreshStats, TransformTree, TreeInput};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Running,
    Stopped,
}

/// [`Pipeline::tick`] 1 回の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 開始前または停止済み
    Idle,
    Ran(TickReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 送信ゲートが開き TF を送った
    pub published: bool,
    pub refresh: RefreshStats,
    /// 送った JointState の数 (0..=2)
    pub joint_states: usize,
    pub headset_pose: bool,
}

struct HeadsetStream {
    topic: String,
    scheduler: PublishScheduler,
    message: PoseStampedMessage,
}

impl HeadsetStream {
    fn from_config(config: &HeadsetPoseConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self {
            topic: config.topic.clone(),
            scheduler: PublishScheduler::from_rate(config.rate_hz),
            message: PoseStampedMessage::new(config.frame_id.clone()),
        })
    }
}

pub struct Pipeline<T: Transport> {
    source: Box<dyn TrackingSource>,
    transport: T,
    convention: Convention,
    tree: TransformTree,
    tf_topics: [String; 2],
    mapper: Option<Box<dyn SkeletonMapper>>,
    joint_topics: [String; 2],
    angles: AngleVector,
    joint_states: [JointStateMessage; 2],
    scheduler: PublishScheduler,
    headset: Option<HeadsetStream>,
    state: State,
    publish_count: u64,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(config: &Config, source: Box<dyn TrackingSource>, transport: T) -> Self {
        let convention = config.frames.source_convention;
        Self {
            source,
            transport,
            convention,
            tree: TransformTree::with_all_joints(&config.frames, convention),
            tf_topics: [config.publish.tf_topic.clone(), config.publish.tf_hands_topic.clone()],
            mapper: mapper_from_config(&config.mapper),
            joint_topics: [config.mapper.left_topic.clone(), config.mapper.right_topic.clone()],
            angles: AngleVector::new(),
            joint_states: [
                JointStateMessage::with_capacity(AngleVector::MAX_ENTRIES),
                JointStateMessage::with_capacity(AngleVector::MAX_ENTRIES),
            ],
            scheduler: PublishScheduler::from_config(&config.publish),
            headset: HeadsetStream::from_config(&config.headset_pose),
            state: State::Created,
            publish_count: 0,
        }
    }

    /// トピックを登録して送信を開始
    pub fn start(&mut self) -> Result<(), TransportError> {
        for topic in &self.tf_topics {
            self.transport.register_topic(topic, MessageKind::Tf)?;
        }
        if self.mapper.is_some() {
            for topic in &self.joint_topics {
                self.transport.register_topic(topic, MessageKind::JointState)?;
            }
        }
        if let Some(headset) = &self.headset {
            self.transport.register_topic(&headset.topic, MessageKind::PoseStamped)?;
        }

        self.scheduler.reset();
        if let Some(headset) = self.headset.as_mut() {
            headset.scheduler.reset();
        }
        self.state = State::Running;
        tracing::info!(
            nodes = self.tree.len(),
            interval = self.scheduler.interval(),
            mapper = self.mapper.is_some(),
            headset_pose = self.headset.is_some(),
            "pipeline started"
        );
        Ok(())
    }

    /// 1 ホストフレーム分の処理
    pub fn tick(&mut self, now: f64) -> Result<TickOutcome, TransportError> {
        if self.state != State::Running {
            return Ok(TickOutcome::Idle);
        }

        self.source.advance(now);
        let mut report = TickReport::default();

        if self.scheduler.poll(now) {
            self.publish_telemetry(&mut report)?;
        }
        report.headset_pose = self.publish_headset(now)?;

        Ok(TickOutcome::Ran(report))
    }

    pub fn stop(&mut self) {
        if self.state == State::Running {
            tracing::info!(published = self.publish_count, "pipeline stopped");
        }
        self.state = State::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn tree(&self) -> &TransformTree {
        &self.tree
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn source(&self) -> &dyn TrackingSource {
        self.source.as_ref()
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    fn publish_telemetry(&mut self, report: &mut TickReport) -> Result<(), TransportError> {
        let source = self.source.as_ref();
        let input = TreeInput {
            headset: source.headset_pose(),
            left_anchor: source.hand_anchor(Side::Left),
            right_anchor: source.hand_anchor(Side::Right),
            left_hand: source.hand(Side::Left),
            right_hand: source.hand(Side::Right),
        };
        report.refresh = self.tree.refresh(&input);

        for topic in &self.tf_topics {
            self.transport.publish(topic, Message::Tf(self.tree.message()))?;
        }
        report.published = true;

        if let Some(mapper) = self.mapper.as_deref() {
            for side in Side::BOTH {
                let hand = source.hand(side);
                if !hand.tracked || source.hand_anchor(side).is_none() {
                    continue;
                }
                let slot = side.index();
                mapper.map_hand(hand, side, &mut self.angles);
                self.joint_states[slot].fill_from(&self.angles);
                self.transport
                    .publish(&self.joint_topics[slot], Message::JointState(&self.joint_states[slot]))?;
                report.joint_states += 1;
            }
        }

        self.publish_count += 1;
        tracing::trace!(
            count = self.publish_count,
            left = report.refresh.left_joints,
            right = report.refresh.right_joints,
            joint_states = report.joint_states,
            "published telemetry"
        );
        Ok(())
    }

    fn publish_headset(&mut self, now: f64) -> Result<bool, TransportError> {
        let headset = match self.headset.as_mut() {
            Some(headset) => headset,
            None => return Ok(false),
        };
        let pose = match self.source.headset_pose() {
            Some(pose) => pose,
            None => return Ok(false),
        };
        if !headset.scheduler.poll(now) {
            return Ok(false);
        }

        headset.message.position = to_flu_translation(self.convention, &pose.position);
        headset.message.orientation = to_flu_rotation(self.convention, &pose.rotation);

        let [x, y, z, w] = headset.message.orientation;
        let (roll, pitch, yaw) =
            UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)).euler_angles();
        tracing::trace!(
            roll = roll.to_degrees(),
            pitch = pitch.to_degrees(),
            yaw = yaw.to_degrees(),
            "headset pose"
        );

        self.transport
            .publish(&headset.topic, Message::PoseStamped(&headset.message))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperKind;
    use crate::hand::{HandJoint, HandSnapshot, JointPose};
    use crate::kinematics::mapper::tests::full_hand;
    use crate::messages::OwnedMessage;
    use crate::transport::MemoryTransport;
    use nalgebra::Vector3;

    /// 固定値を返すテスト用ソース
    struct FixedSource {
        headset: Option<JointPose>,
        anchors: [Option<JointPose>; 2],
        hands: [HandSnapshot; 2],
        advanced: usize,
    }

    impl FixedSource {
        fn both_hands() -> Self {
            Self {
                headset: Some(JointPose::at(Vector3::new(0.0, 1.6, 0.0))),
                anchors: [Some(JointPose::identity()), Some(JointPose::identity())],
                hands: [full_hand(), full_hand()],
                advanced: 0,
            }
        }
    }

    impl TrackingSource for FixedSource {
        fn advance(&mut self, _now: f64) {
            self.advanced += 1;
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
    }

    fn pipeline_with(config: &Config, source: FixedSource) -> Pipeline<MemoryTransport> {
        Pipeline::new(config, Box::new(source), MemoryTransport::new())
    }

    fn report(outcome: TickOutcome) -> TickReport {
        match outcome {
            TickOutcome::Ran(report) => report,
            TickOutcome::Idle => panic!("expected a running tick"),
        }
    }

    #[test]
    fn test_tick_before_start_is_idle() {
        let mut p = pipeline_with(&Config::default(), FixedSource::both_hands());
        assert_eq!(p.tick(0.0).unwrap(), TickOutcome::Idle);
        assert!(p.transport().published().is_empty());
    }

    #[test]
    fn test_start_registers_topics() {
        let mut p = pipeline_with(&Config::default(), FixedSource::both_hands());
        p.start().unwrap();
        let topics = p.transport().topics();
        assert_eq!(topics.kind_of("tf"), Some(MessageKind::Tf));
        assert_eq!(topics.kind_of("tf_hands"), Some(MessageKind::Tf));
        assert_eq!(topics.kind_of("left_hand/joint_states"), Some(MessageKind::JointState));
        assert_eq!(topics.kind_of("right_hand/joint_states"), Some(MessageKind::JointState));
        assert_eq!(topics.kind_of("hmd_pose"), None);
    }

    #[test]
    fn test_fired_tick_publishes_everything() {
        let mut p = pipeline_with(&Config::default(), FixedSource::both_hands());
        p.start().unwrap();
        let r = report(p.tick(0.0).unwrap());
        assert!(r.published);
        assert!(r.refresh.headset);
        assert_eq!(r.refresh.left_joints, HandJoint::COUNT);
        assert_eq!(r.joint_states, 2);

        let t = p.transport();
        assert_eq!(t.on_topic("tf").count(), 1);
        assert_eq!(t.on_topic("tf_hands").count(), 1);
        match t.on_topic("tf").next() {
            Some(OwnedMessage::Tf(tf)) => assert_eq!(tf.transforms.len(), 3 + 2 * HandJoint::COUNT),
            other => panic!("unexpected {:?}", other),
        }
        let right = t.on_topic("right_hand/joint_states").next();
        match right {
            Some(OwnedMessage::JointState(js)) => {
                assert_eq!(js.len(), 15);
                assert!(js.name.iter().all(|n| n.starts_with("right_")));
                assert!(js.velocity.is_empty() && js.effort.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        };
    }

    #[test]
    fn test_scheduler_throttles_publishing() {
        let mut p = pipeline_with(&Config::default(), FixedSource::both_hands());
        p.start().unwrap();
        let fired: Vec<bool> = [0.0, 0.02, 0.034, 0.067]
            .iter()
            .map(|t| report(p.tick(*t).unwrap()).published)
            .collect();
        assert_eq!(fired, vec![true, false, true, false]);
        assert_eq!(p.transport().on_topic("tf").count(), 2);
        assert_eq!(p.publish_count(), 2);
    }

    #[test]
    fn test_untracked_hand_skips_joint_state() {
        let mut source = FixedSource::both_hands();
        source.hands[1].tracked = false;
        source.anchors[0] = None;
        let mut p = pipeline_with(&Config::default(), source);
        p.start().unwrap();
        let r = report(p.tick(0.0).unwrap());
        assert_eq!(r.joint_states, 0);
        // TF は常に送る
        assert_eq!(p.transport().on_topic("tf").count(), 1);
        assert_eq!(p.transport().on_topic("left_hand/joint_states").count(), 0);
        assert_eq!(p.transport().on_topic("right_hand/joint_states").count(), 0);
    }

    #[test]
    fn test_no_mapper_publishes_tf_only() {
        let mut config = Config::default();
        config.mapper.kind = MapperKind::None;
        let mut p = pipeline_with(&config, FixedSource::both_hands());
        p.start().unwrap();
        let r = report(p.tick(0.0).unwrap());
        assert_eq!(r.joint_states, 0);
        assert_eq!(p.transport().topics().kind_of("left_hand/joint_states"), None);
        assert_eq!(p.transport().published().len(), 2);
    }

    #[test]
    fn test_headset_pose_stream() {
        let mut config = Config::default();
        config.headset_pose.enabled = true;
        config.headset_pose.rate_hz = 10.0;
        let mut p = pipeline_with(&config, FixedSource::both_hands());
        p.start().unwrap();

        assert!(report(p.tick(0.0).unwrap()).headset_pose);
        assert!(!report(p.tick(0.05).unwrap()).headset_pose);
        assert!(report(p.tick(0.1).unwrap()).headset_pose);

        let pose = p.transport().on_topic("hmd_pose").next();
        match pose {
            Some(OwnedMessage::PoseStamped(pose)) => {
                assert_eq!(pose.frame_id, "vr_origin");
                // Unity の Y (上) → FLU の Z
                assert!((pose.position[2] - 1.6).abs() < 1e-6);
            }
            other => panic!("unexpected {:?}", other),
        };
    }

    #[test]
    fn test_stop_makes_ticks_idle() {
        let mut p = pipeline_with(&Config::default(), FixedSource::both_hands());
        p.start().unwrap();
        p.tick(0.0).unwrap();
        p.stop();
        assert!(!p.is_running());
        assert_eq!(p.tick(1.0).unwrap(), TickOutcome::Idle);
        assert_eq!(p.transport().on_topic("tf").count(), 1);
    }

    #[test]
    fn test_joint_state_buffers_are_reused() {
        let mut config = Config::default();
        config.publish.rate_hz = 0.0;
        let mut p = pipeline_with(&config, FixedSource::both_hands());
        p.start().unwrap();
        p.tick(0.0).unwrap();
        let capacity = p.joint_states[0].name.capacity();
        for i in 1..10 {
            p.tick(i as f64 * 0.01).unwrap();
        }
        assert_eq!(p.joint_states[0].name.capacity(), capacity);
        assert_eq!(p.transport().on_topic("left_hand/joint_states").count(), 10);
    }
}
