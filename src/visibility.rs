//! 手元メニューの表示判定（角度と距離のヒステリシス）
//!
//! テレメトリとは独立して動く。出力はフェード用 alpha と操作可否フラグ。

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::VisibilityConfig;
use crate::hand::JointPose;
use crate::kinematics::geometry::unit_or_identity;

/// 1フレーム分の判定入力
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilitySample {
    /// 要素の正面とカメラ方向の内積 (1: 正面, -1: 背面)
    pub facing_dot: f32,
    /// カメラまでの距離（メートル）
    pub distance: f32,
}

/// 要素の位置・前方向とカメラ位置から判定入力を作る
///
/// 要素の正面は -forward 側（カメラに向けて表示面を向ける配置）
pub fn sample_from_geometry(
    element_position: &Vector3<f32>,
    element_forward: &Vector3<f32>,
    camera_position: &Vector3<f32>,
) -> VisibilitySample {
    let offset = camera_position - element_position;
    let to_camera = offset.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
    VisibilitySample {
        facing_dot: (-element_forward).dot(&to_camera),
        distance: offset.norm(),
    }
}

/// 手首メニュー用の判定入力。手のひら側 (ローカル -Y) を表示面とする
pub fn palm_menu_sample(palm: &JointPose, camera_position: &Vector3<f32>) -> VisibilitySample {
    let back_of_hand = unit_or_identity(&palm.rotation) * Vector3::y();
    sample_from_geometry(&palm.position, &back_of_hand, camera_position)
}

/// 要素の +Z がカメラを向く回転。方向が決まらない場合は None
pub fn billboard_rotation(
    element_position: &Vector3<f32>,
    camera_position: &Vector3<f32>,
    up: &Vector3<f32>,
) -> Option<UnitQuaternion<f32>> {
    let dir = (camera_position - element_position).try_normalize(f32::EPSILON)?;
    if dir.cross(up).norm() < 1e-6 {
        return None;
    }
    Some(UnitQuaternion::face_towards(&dir, up))
}

/// current を target に向けて最大 max_delta だけ動かす
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// レイキャスト有効/無効の切り替え先（存在する場合のみ設定）
pub trait RaycastToggle {
    fn set_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOutput {
    /// フェード中の不透明度 (0..=1)
    pub alpha: f32,
    /// 目標状態に従う（alpha ではない）
    pub interactable: bool,
    pub blocks_raycasts: bool,
}

/// 表示/非表示のヒステリシス状態機械
///
/// show_angle_deg <= hide_angle_deg を前提とする。逆に設定すると
/// 帯域が反転して毎フレーム切り替わり得るが、ここでは補正しない。
pub struct VisibilityGate {
    cos_show: f32,
    cos_hide: f32,
    min_distance: f32,
    max_distance: f32,
    fade_speed: f32,
    visible: bool,
    alpha: f32,
    raycaster: Option<Box<dyn RaycastToggle>>,
}

impl VisibilityGate {
    pub fn new(
        show_angle_deg: f32,
        hide_angle_deg: f32,
        min_distance: f32,
        max_distance: f32,
        fade_speed: f32,
    ) -> Self {
        Self {
            cos_show: show_angle_deg.to_radians().cos(),
            cos_hide: hide_angle_deg.to_radians().cos(),
            min_distance,
            max_distance,
            fade_speed,
            visible: false,
            alpha: 0.0,
            raycaster: None,
        }
    }

    pub fn from_config(config: &VisibilityConfig) -> Self {
        Self::new(
            config.show_angle_deg,
            config.hide_angle_deg,
            config.min_distance,
            config.max_distance,
            config.fade_speed,
        )
    }

    pub fn with_raycaster(mut self, raycaster: Box<dyn RaycastToggle>) -> Self {
        self.raycaster = Some(raycaster);
        self
    }

    /// 実行中に角度閾値を変更
    pub fn set_angle_thresholds(&mut self, show_deg: f32, hide_deg: f32) {
        self.cos_show = show_deg.to_radians().cos();
        self.cos_hide = hide_deg.to_radians().cos();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn cos_thresholds(&self) -> (f32, f32) {
        (self.cos_show, self.cos_hide)
    }

    /// 目標状態だけを更新して返す
    pub fn evaluate(&mut self, sample: VisibilitySample) -> bool {
        let in_range = sample.distance >= self.min_distance && sample.distance <= self.max_distance;
        if self.visible {
            if sample.facing_dot < self.cos_hide || !in_range {
                self.visible = false;
            }
        } else if sample.facing_dot >= self.cos_show && in_range {
            self.visible = true;
        }
        self.visible
    }

    /// 判定 + フェード + レイキャスト切り替え
    pub fn update(&mut self, sample: VisibilitySample, dt: f32) -> VisibilityOutput {
        let visible = self.evaluate(sample);

        let target = if visible { 1.0 } else { 0.0 };
        self.alpha = move_towards(self.alpha, target, self.fade_speed * dt.max(0.0));

        if let Some(raycaster) = self.raycaster.as_mut() {
            raycaster.set_enabled(visible);
        }

        VisibilityOutput {
            alpha: self.alpha,
            interactable: visible,
            blocks_raycasts: visible,
        }
    }
}
