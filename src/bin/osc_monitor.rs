//! ブリッジの OSC を受信し、1 メッセージ 1 行で表示する

use anyhow::{Context, Result};
use clap::Parser;
use rosc::{decoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "osc_monitor", about = "Print OSC telemetry received from xr-hand-bridge")]
struct Args {
    /// 待ち受けアドレス
    #[arg(short, long, default_value = "127.0.0.1:10000")]
    listen: String,

    /// TF ノードを 1 行ずつ表示する
    #[arg(long)]
    verbose: bool,

    /// この数のパケットで終了
    #[arg(long)]
    count: Option<u64>,
}

fn describe_message(msg: &OscMessage) -> String {
    let strings = msg
        .args
        .iter()
        .filter(|a| matches!(a, OscType::String(_)))
        .count();
    let floats: Vec<f32> = msg
        .args
        .iter()
        .filter_map(|a| match a {
            OscType::Float(v) => Some(*v),
            OscType::Double(v) => Some(*v as f32),
            _ => None,
        })
        .collect();

    match msg.args.first() {
        Some(OscType::String(first)) if strings == 1 => {
            format!("{} [{}] {:?}", msg.addr, first, floats)
        }
        Some(OscType::String(first)) if strings == 2 => {
            let child = match msg.args.get(1) {
                Some(OscType::String(child)) => child.as_str(),
                _ => "?",
            };
            format!("{} {} -> {} {:?}", msg.addr, first, child, floats)
        }
        _ => format!("{} {} joints", msg.addr, strings),
    }
}

fn print_packet(packet: &OscPacket, verbose: bool) {
    match packet {
        OscPacket::Message(msg) => println!("{}", describe_message(msg)),
        OscPacket::Bundle(bundle) => {
            let addr = bundle.content.iter().find_map(|p| match p {
                OscPacket::Message(m) => Some(m.addr.as_str()),
                _ => None,
            });
            println!("{} bundle: {} nodes", addr.unwrap_or("?"), bundle.content.len());
            if verbose {
                for inner in &bundle.content {
                    print!("  ");
                    print_packet(inner, false);
                }
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let socket = UdpSocket::bind(&args.listen)
        .with_context(|| format!("failed to bind {}", args.listen))?;
    tracing::info!(listen = %args.listen, version = env!("GIT_VERSION"), "osc_monitor");

    let mut buf = vec![0u8; 65_536];
    let mut received: u64 = 0;
    loop {
        let (n, from) = socket.recv_from(&mut buf)?;
        match decoder::decode_udp(&buf[..n]) {
            Ok((_, packet)) => print_packet(&packet, args.verbose),
            Err(e) => tracing::warn!(%from, error = ?e, "undecodable datagram"),
        }

        received += 1;
        if args.count.is_some_and(|c| received >= c) {
            break;
        }
    }
    Ok(())
}
