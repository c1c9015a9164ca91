use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::Vector3;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use xr_hand_bridge::config::Config;
use xr_hand_bridge::hand::{HandJoint, Side};
use xr_hand_bridge::pipeline::{Pipeline, TickOutcome};
use xr_hand_bridge::source::{source_from_config, TrackingSource};
use xr_hand_bridge::transport::{MemoryTransport, OscTransport, Transport};
use xr_hand_bridge::visibility::{billboard_rotation, palm_menu_sample, VisibilityGate};

#[derive(Parser, Debug)]
#[command(name = "xr-hand-bridge", about = "Stream hand telemetry over OSC")]
struct Args {
    /// 設定ファイル
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// このフレーム数で終了
    #[arg(long)]
    frames: Option<u64>,

    /// この秒数で終了
    #[arg(long)]
    duration: Option<f64>,

    /// 送信せずメモリに記録するだけ
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config);
    config.warn_suspicious();

    tracing::info!(version = env!("GIT_VERSION"), "xr-hand-bridge");
    tracing::info!(
        addr = %config.transport.addr,
        rate_hz = config.publish.rate_hz,
        host_fps = config.app.host_fps,
        source = ?config.source.kind,
        "config loaded"
    );

    let source = source_from_config(&config.source).context("failed to open tracking source")?;

    if args.dry_run {
        let pipeline = Pipeline::new(&config, source, MemoryTransport::new());
        let pipeline = run(pipeline, &config, &args)?;
        tracing::info!(messages = pipeline.transport().published().len(), "dry run finished");
    } else {
        let transport = OscTransport::from_config(&config.transport)
            .with_context(|| format!("failed to open OSC socket to {}", config.transport.addr))?;
        run(Pipeline::new(&config, source, transport), &config, &args)?;
    }

    tracing::info!("Shutting down...");
    Ok(())
}

fn run<T: Transport>(mut pipeline: Pipeline<T>, config: &Config, args: &Args) -> Result<Pipeline<T>> {
    pipeline.start().context("failed to register topics")?;

    let mut menu = VisibilityGate::from_config(&config.visibility);
    let frame_duration = Duration::from_secs_f64(1.0 / config.app.host_fps.max(1.0) as f64);
    let start = Instant::now();
    let mut last_frame = start;

    let mut frame: u64 = 0;
    let mut published = 0u32;
    let mut stats_timer = Instant::now();

    loop {
        let loop_start = Instant::now();
        let now = start.elapsed().as_secs_f64();

        if let TickOutcome::Ran(report) = pipeline.tick(now)? {
            if report.published {
                published += 1;
            }
        }

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = loop_start;
        update_menu(&mut menu, pipeline.source(), config.visibility.billboard, dt);

        frame += 1;
        if args.frames.is_some_and(|n| frame >= n)
            || args.duration.is_some_and(|d| now >= d)
            || pipeline.source().is_finished()
        {
            break;
        }

        let elapsed = stats_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            tracing::info!(
                rate = published as f32 / elapsed,
                left = pipeline.source().hand(Side::Left).tracked,
                right = pipeline.source().hand(Side::Right).tracked,
                menu = menu.is_visible(),
                "publish"
            );
            published = 0;
            stats_timer = Instant::now();
        }

        // ホストフレーム周期（spin wait）
        while loop_start.elapsed() < frame_duration {
            std::hint::spin_loop();
        }
    }

    pipeline.stop();
    Ok(pipeline)
}

/// 左手首メニューの表示判定。手のひら側を表示面とする
fn update_menu(menu: &mut VisibilityGate, source: &dyn TrackingSource, billboard: bool, dt: f32) {
    let (camera, palm) = match (source.headset_pose(), source.hand(Side::Left).get(HandJoint::Palm)) {
        (Some(camera), Some(palm)) => (camera, *palm),
        _ => return,
    };
    let sample = palm_menu_sample(&palm, &camera.position);

    let was_visible = menu.is_visible();
    let out = menu.update(sample, dt);
    if out.interactable != was_visible {
        tracing::debug!(visible = out.interactable, facing = sample.facing_dot, distance = sample.distance, "menu");
    }

    if billboard && out.interactable {
        if let Some(rotation) = billboard_rotation(&palm.position, &camera.position, &Vector3::y()) {
            tracing::trace!(?rotation, alpha = out.alpha, "menu billboard");
        }
    }
}
