use crate::error::TransportError;
use crate::messages::{Message, MessageKind, OwnedMessage};

use super::{TopicRegistry, Transport};

/// 送信内容をすべて記録する。テストと dry run 用
#[derive(Debug, Default)]
pub struct MemoryTransport {
    topics: TopicRegistry,
    published: Vec<(String, OwnedMessage)>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    pub fn published(&self) -> &[(String, OwnedMessage)] {
        &self.published
    }

    /// 1 トピック分のメッセージ（古い順）
    pub fn on_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a OwnedMessage> + 'a {
        self.published
            .iter()
            .filter(move |(t, _)| t == topic)
            .map(|(_, m)| m)
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Transport for MemoryTransport {
    fn register_topic(&mut self, topic: &str, kind: MessageKind) -> Result<(), TransportError> {
        self.topics.register(topic, kind)
    }

    fn publish(&mut self, topic: &str, message: Message<'_>) -> Result<(), TransportError> {
        self.topics.check(topic, message.kind())?;
        self.published.push((topic.to_string(), message.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{JointStateMessage, TfMessage};

    #[test]
    fn test_records_messages() {
        let mut transport = MemoryTransport::new();
        transport.register_topic("tf", MessageKind::Tf).unwrap();
        transport.register_topic("left_hand/joint_states", MessageKind::JointState).unwrap();

        let tf = TfMessage::default();
        let js = JointStateMessage::default();
        transport.publish("tf", Message::Tf(&tf)).unwrap();
        transport.publish("left_hand/joint_states", Message::JointState(&js)).unwrap();
        transport.publish("tf", Message::Tf(&tf)).unwrap();

        assert_eq!(transport.published().len(), 3);
        assert_eq!(transport.on_topic("tf").count(), 2);
        assert!(matches!(
            transport.on_topic("left_hand/joint_states").next(),
            Some(OwnedMessage::JointState(_))
        ));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut transport = MemoryTransport::new();
        transport.register_topic("tf", MessageKind::Tf).unwrap();
        let js = JointStateMessage::default();
        let err = transport.publish("tf", Message::JointState(&js)).unwrap_err();
        assert!(matches!(err, TransportError::KindMismatch { .. }));
        assert!(transport.published().is_empty());
    }
}
