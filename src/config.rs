use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::tf::Convention;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub headset_pose: HeadsetPoseConfig,
    #[serde(default)]
    pub visibility: VisibilityConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// ホスト側のフレームレート（ドライバのループ周期）
    #[serde(default = "default_host_fps")]
    pub host_fps: f32,
}

fn default_host_fps() -> f32 { 90.0 }

impl Default for AppConfig {
    fn default() -> Self {
        Self { host_fps: default_host_fps() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// 送信先 (OSC/UDP)
    #[serde(default = "default_transport_addr")]
    pub addr: String,
    /// ローカルのバインドアドレス
    #[serde(default = "default_bind_addr")]
    pub bind: String,
}

fn default_transport_addr() -> String { "127.0.0.1:10000".to_string() }
fn default_bind_addr() -> String { "0.0.0.0:0".to_string() }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            addr: default_transport_addr(),
            bind: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// 送信レート (Hz)。0 以下で毎フレーム送信
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
    /// N フレームに 1 回だけ送信候補にする
    #[serde(default = "default_decimation")]
    pub decimation: u32,
    #[serde(default = "default_tf_topic")]
    pub tf_topic: String,
    #[serde(default = "default_tf_hands_topic")]
    pub tf_hands_topic: String,
}

fn default_rate_hz() -> f64 { 30.0 }
fn default_decimation() -> u32 { 1 }
fn default_tf_topic() -> String { "tf".to_string() }
fn default_tf_hands_topic() -> String { "tf_hands".to_string() }

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            decimation: default_decimation(),
            tf_topic: default_tf_topic(),
            tf_hands_topic: default_tf_hands_topic(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FramesConfig {
    #[serde(default = "default_root_frame")]
    pub root: String,
    #[serde(default = "default_headset_frame")]
    pub headset: String,
    #[serde(default = "default_hand_left_frame")]
    pub hand_left: String,
    #[serde(default = "default_hand_right_frame")]
    pub hand_right: String,
    /// トラッキングソースの座標系
    #[serde(default)]
    pub source_convention: Convention,
}

fn default_root_frame() -> String { "vr_world".to_string() }
fn default_headset_frame() -> String { "hmd".to_string() }
fn default_hand_left_frame() -> String { "hand_left".to_string() }
fn default_hand_right_frame() -> String { "hand_right".to_string() }

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            root: default_root_frame(),
            headset: default_headset_frame(),
            hand_left: default_hand_left_frame(),
            hand_right: default_hand_right_frame(),
            source_convention: Convention::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKind {
    #[default]
    Flexion,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub kind: MapperKind,
    #[serde(default = "default_left_joint_topic")]
    pub left_topic: String,
    #[serde(default = "default_right_joint_topic")]
    pub right_topic: String,
    /// 親指 joint3 (常に 0.0) を出力するか
    #[serde(default = "default_true")]
    pub thumb_placeholder: bool,
}

fn default_left_joint_topic() -> String { "left_hand/joint_states".to_string() }
fn default_right_joint_topic() -> String { "right_hand/joint_states".to_string() }
fn default_true() -> bool { true }

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            kind: MapperKind::default(),
            left_topic: default_left_joint_topic(),
            right_topic: default_right_joint_topic(),
            thumb_placeholder: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadsetPoseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_headset_topic")]
    pub topic: String,
    #[serde(default = "default_headset_frame_id")]
    pub frame_id: String,
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
}

fn default_headset_topic() -> String { "hmd_pose".to_string() }
fn default_headset_frame_id() -> String { "vr_origin".to_string() }

impl Default for HeadsetPoseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            topic: default_headset_topic(),
            frame_id: default_headset_frame_id(),
            rate_hz: default_rate_hz(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityConfig {
    /// 表示を始める角度（度）
    #[serde(default = "default_show_angle")]
    pub show_angle_deg: f32,
    /// 非表示にする角度（度）。show_angle_deg 以上にすること
    #[serde(default = "default_hide_angle")]
    pub hide_angle_deg: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// alpha の変化速度 (1/秒)
    #[serde(default = "default_fade_speed")]
    pub fade_speed: f32,
    #[serde(default = "default_true")]
    pub billboard: bool,
}

fn default_show_angle() -> f32 { 50.0 }
fn default_hide_angle() -> f32 { 60.0 }
fn default_min_distance() -> f32 { 0.08 }
fn default_max_distance() -> f32 { 0.8 }
fn default_fade_speed() -> f32 { 12.0 }

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            show_angle_deg: default_show_angle(),
            hide_angle_deg: default_hide_angle(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            fade_speed: default_fade_speed(),
            billboard: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Replay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// JSON Lines 形式の記録ファイル
    #[serde(default = "default_replay_path")]
    pub replay_path: String,
    #[serde(default = "default_true")]
    pub loop_replay: bool,
}

fn default_replay_path() -> String { "recordings/hands.jsonl".to_string() }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            replay_path: default_replay_path(),
            loop_replay: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default config");
                Self::default()
            }
        }
    }

    /// 実行時には補正しない設定ミスを警告する
    pub fn warn_suspicious(&self) {
        let v = &self.visibility;
        if v.hide_angle_deg < v.show_angle_deg {
            tracing::warn!(
                show = v.show_angle_deg,
                hide = v.hide_angle_deg,
                "hide_angle_deg < show_angle_deg: visibility hysteresis is inverted and may flicker"
            );
        }
        if v.min_distance > v.max_distance {
            tracing::warn!(
                min = v.min_distance,
                max = v.max_distance,
                "min_distance > max_distance: menu can never become visible"
            );
        }
    }
}
