//! エラー型
//!
//! 関節の欠落やロスト、長さ 0 のボーン、ゼロ四元数といったデータ品質の問題は
//! パイプライン内で吸収し、ここには出てこない。

use std::io;

use thiserror::Error;

use crate::messages::MessageKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error("OSC encoding failed: {0}")]
    Encode(#[from] rosc::OscError),

    #[error("topic {0} was published before being registered")]
    UnregisteredTopic(String),

    #[error("topic {topic} is registered as {registered:?} but got {got:?}")]
    KindMismatch {
        topic: String,
        registered: MessageKind,
        got: MessageKind,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open recording {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("bad frame on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("recording {0} contains no frames")]
    Empty(String),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
