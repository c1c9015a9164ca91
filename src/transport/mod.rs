//! パイプラインと外部との送信口

pub mod memory;
pub mod osc;

use std::collections::HashMap;

use crate::error::TransportError;
use crate::messages::{Message, MessageKind};

pub use memory::MemoryTransport;
pub use osc::OscTransport;

pub trait Transport {
    /// トピックとその種別を登録する。同じ種別での再登録は何もしない
    fn register_topic(&mut self, topic: &str, kind: MessageKind) -> Result<(), TransportError>;

    /// 1 メッセージ送信。メッセージは呼び出しの間だけ借用する
    fn publish(&mut self, topic: &str, message: Message<'_>) -> Result<(), TransportError>;
}

/// トピック名 → 登録種別（各トランスポート共通）
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: HashMap<String, MessageKind>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, topic: &str, kind: MessageKind) -> Result<(), TransportError> {
        match self.topics.get(topic) {
            Some(&registered) if registered != kind => Err(TransportError::KindMismatch {
                topic: topic.to_string(),
                registered,
                got: kind,
            }),
            Some(_) => Ok(()),
            None => {
                tracing::debug!(topic, kind = kind.as_str(), "registered topic");
                self.topics.insert(topic.to_string(), kind);
                Ok(())
            }
        }
    }

    /// `topic` が `kind` で登録済みでなければエラー
    pub fn check(&self, topic: &str, kind: MessageKind) -> Result<(), TransportError> {
        match self.topics.get(topic) {
            None => Err(TransportError::UnregisteredTopic(topic.to_string())),
            Some(&registered) if registered != kind => Err(TransportError::KindMismatch {
                topic: topic.to_string(),
                registered,
                got: kind,
            }),
            Some(_) => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn kind_of(&self, topic: &str) -> Option<MessageKind> {
        self.topics.get(topic).copied()
    }
}
