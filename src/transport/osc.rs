use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscTime, OscType};
use std::net::UdpSocket;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::messages::{
    JointStateMessage, Message, MessageKind, PoseStampedMessage, TfMessage, TransformStamped,
};

use super::{TopicRegistry, Transport};

/// OSC の「即時」タイムタグ
const IMMEDIATE: OscTime = OscTime { seconds: 0, fractional: 1 };

/// トピック名から OSC アドレス (`/{topic}`)
pub fn topic_address(topic: &str) -> String {
    if topic.starts_with('/') {
        topic.to_string()
    } else {
        format!("/{}", topic)
    }
}

/// 引数: parent, child, tx, ty, tz, qx, qy, qz, qw
pub fn build_transform_message(address: &str, t: &TransformStamped) -> OscMessage {
    OscMessage {
        addr: address.to_string(),
        args: vec![
            OscType::String(t.parent_frame().to_string()),
            OscType::String(t.child_frame().to_string()),
            OscType::Float(t.translation[0] as f32),
            OscType::Float(t.translation[1] as f32),
            OscType::Float(t.translation[2] as f32),
            OscType::Float(t.rotation[0] as f32),
            OscType::Float(t.rotation[1] as f32),
            OscType::Float(t.rotation[2] as f32),
            OscType::Float(t.rotation[3] as f32),
        ],
    }
}

/// TF 全ノードを 1 バンドルにまとめる
pub fn build_tf_packet(topic: &str, tf: &TfMessage) -> OscPacket {
    let address = topic_address(topic);
    OscPacket::Bundle(OscBundle {
        timetag: IMMEDIATE,
        content: tf
            .transforms
            .iter()
            .map(|t| OscPacket::Message(build_transform_message(&address, t)))
            .collect(),
    })
}

/// 引数: name0, pos0, name1, pos1, ...
pub fn build_joint_state_packet(topic: &str, js: &JointStateMessage) -> OscPacket {
    let mut args = Vec::with_capacity(js.len() * 2);
    for (name, position) in js.name.iter().zip(js.position.iter()) {
        args.push(OscType::String(name.to_string()));
        args.push(OscType::Float(*position as f32));
    }
    OscPacket::Message(OscMessage {
        addr: topic_address(topic),
        args,
    })
}

/// 引数: frame_id, px, py, pz, qx, qy, qz, qw
pub fn build_pose_packet(topic: &str, pose: &PoseStampedMessage) -> OscPacket {
    let mut args = Vec::with_capacity(8);
    args.push(OscType::String(pose.frame_id.clone()));
    args.extend(pose.position.iter().map(|v| OscType::Float(*v as f32)));
    args.extend(pose.orientation.iter().map(|v| OscType::Float(*v as f32)));
    OscPacket::Message(OscMessage {
        addr: topic_address(topic),
        args,
    })
}

pub fn build_packet(topic: &str, message: Message<'_>) -> OscPacket {
    match message {
        Message::Tf(tf) => build_tf_packet(topic, tf),
        Message::JointState(js) => build_joint_state_packet(topic, js),
        Message::PoseStamped(pose) => build_pose_packet(topic, pose),
    }
}

/// OSC パケットをバイト列にエンコード
pub fn encode_packet(packet: &OscPacket) -> Result<Vec<u8>, TransportError> {
    Ok(encoder::encode(packet)?)
}

/// OSC/UDP 送信クライアント
pub struct OscTransport {
    socket: UdpSocket,
    target_addr: String,
    topics: TopicRegistry,
}

impl OscTransport {
    pub fn new(bind_addr: &str, target_addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind_addr)?;
        tracing::info!(bind = bind_addr, target = target_addr, "OSC transport ready");
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
            topics: TopicRegistry::new(),
        })
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        Self::new(&config.bind, &config.addr)
    }

    pub fn target_addr(&self) -> &str {
        &self.target_addr
    }
}

impl Transport for OscTransport {
    fn register_topic(&mut self, topic: &str, kind: MessageKind) -> Result<(), TransportError> {
        self.topics.register(topic, kind)
    }

    fn publish(&mut self, topic: &str, message: Message<'_>) -> Result<(), TransportError> {
        self.topics.check(topic, message.kind())?;
        let data = encode_packet(&build_packet(topic, message))?;
        self.socket.send_to(&data, &self.target_addr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::decoder;

    fn sample_tf() -> TfMessage {
        let mut a = TransformStamped::new("vr_world".to_string(), "hmd".to_string());
        a.translation = [1.0, 2.0, 3.0];
        let b = TransformStamped::new("hand_left".to_string(), "hand_left/wrist".to_string());
        TfMessage { transforms: vec![a, b] }
    }

    #[test]
    fn test_topic_address() {
        assert_eq!(topic_address("tf"), "/tf");
        assert_eq!(topic_address("left_hand/joint_states"), "/left_hand/joint_states");
        assert_eq!(topic_address("/tf"), "/tf");
    }

    #[test]
    fn test_tf_bundle_one_message_per_node() {
        let packet = build_tf_packet("tf_hands", &sample_tf());
        let bundle = match packet {
            OscPacket::Bundle(b) => b,
            _ => panic!("expected bundle"),
        };
        assert_eq!(bundle.content.len(), 2);
        let msg = match &bundle.content[0] {
            OscPacket::Message(m) => m,
            _ => panic!("expected message"),
        };
        assert_eq!(msg.addr, "/tf_hands");
        assert_eq!(msg.args.len(), 9);
        assert_eq!(msg.args[0], OscType::String("vr_world".to_string()));
        assert_eq!(msg.args[1], OscType::String("hmd".to_string()));
        assert_eq!(msg.args[2], OscType::Float(1.0));
        assert_eq!(msg.args[4], OscType::Float(3.0));
        // 単位回転 (x, y, z, w)
        assert_eq!(msg.args[8], OscType::Float(1.0));
    }

    #[test]
    fn test_joint_state_args_alternate() {
        let js = JointStateMessage {
            name: vec!["left_index_joint1", "left_index_joint2"],
            position: vec![0.5, -0.25],
            velocity: Vec::new(),
            effort: Vec::new(),
        };
        let packet = build_joint_state_packet("left_hand/joint_states", &js);
        let msg = match packet {
            OscPacket::Message(m) => m,
            _ => panic!("expected message"),
        };
        assert_eq!(msg.addr, "/left_hand/joint_states");
        assert_eq!(
            msg.args,
            vec![
                OscType::String("left_index_joint1".to_string()),
                OscType::Float(0.5),
                OscType::String("left_index_joint2".to_string()),
                OscType::Float(-0.25),
            ]
        );
    }

    #[test]
    fn test_pose_packet() {
        let mut pose = PoseStampedMessage::new("vr_origin");
        pose.position = [0.0, 0.0, 1.6];
        let msg = match build_pose_packet("hmd_pose", &pose) {
            OscPacket::Message(m) => m,
            _ => panic!("expected message"),
        };
        assert_eq!(msg.args.len(), 8);
        assert_eq!(msg.args[0], OscType::String("vr_origin".to_string()));
        assert_eq!(msg.args[3], OscType::Float(1.6));
        assert_eq!(msg.args[7], OscType::Float(1.0));
    }

    #[test]
    fn test_encode_and_decode_bundle() {
        let data = encode_packet(&build_tf_packet("tf", &sample_tf())).unwrap();
        let (_, decoded) = decoder::decode_udp(&data).unwrap();
        match decoded {
            OscPacket::Bundle(b) => assert_eq!(b.content.len(), 2),
            _ => panic!("expected bundle"),
        }
    }

    #[test]
    fn test_publish_requires_registration() {
        let mut transport = OscTransport::new("127.0.0.1:0", "127.0.0.1:9").unwrap();
        let tf = sample_tf();
        let err = transport.publish("tf", Message::Tf(&tf)).unwrap_err();
        assert!(matches!(err, TransportError::UnregisteredTopic(_)));
    }

    #[test]
    fn test_publish_over_udp() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = receiver.local_addr().unwrap().to_string();
        let mut transport = OscTransport::new("127.0.0.1:0", &target).unwrap();
        transport.register_topic("hmd_pose", MessageKind::PoseStamped).unwrap();

        let pose = PoseStampedMessage::new("vr_origin");
        transport.publish("hmd_pose", Message::PoseStamped(&pose)).unwrap();

        let mut buf = [0u8; rosc::decoder::MTU];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = decoder::decode_udp(&buf[..n]).unwrap();
        match packet {
            OscPacket::Message(m) => assert_eq!(m.addr, "/hmd_pose"),
            _ => panic!("expected message"),
        }
    }
}
