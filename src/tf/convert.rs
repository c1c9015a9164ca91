use nalgebra::{Quaternion, Vector3};
use serde::Deserialize;

use crate::messages::TransformStamped;

/// トラッキングソースの座標系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// X: 右, Y: 上, Z: 前 (左手系、ゲームエンジン標準)
    #[default]
    Ruf,
    /// X: 前, Y: 左, Z: 上 (右手系、変換不要)
    Flu,
}

pub const IDENTITY_ROTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// 位置を FLU へ
pub fn to_flu_translation(convention: Convention, v: &Vector3<f32>) -> [f64; 3] {
    let (x, y, z) = (v.x as f64, v.y as f64, v.z as f64);
    match convention {
        Convention::Ruf => [z, -x, y],
        Convention::Flu => [x, y, z],
    }
}

/// 回転を FLU の (x, y, z, w) へ。全 0 は単位回転に補正する
pub fn to_flu_rotation(convention: Convention, q: &Quaternion<f32>) -> [f64; 4] {
    let (x, y, z, w) = (q.i as f64, q.j as f64, q.k as f64, q.w as f64);
    let mut out = match convention {
        // 軸の入れ替えと掌性の反転
        Convention::Ruf => [z, -x, y, -w],
        Convention::Flu => [x, y, z, w],
    };
    repair_rotation(&mut out);
    out
}

/// 一度も初期化されていない姿勢は全成分 0 で届くので、単位回転に置き換える
pub fn repair_rotation(rotation: &mut [f64; 4]) {
    if rotation.iter().all(|c| *c == 0.0) {
        *rotation = IDENTITY_ROTATION;
    }
}

/// 変換してノードに書き込む（フレーム名には触れない）
pub fn write_pose(
    node: &mut TransformStamped,
    convention: Convention,
    translation: &Vector3<f32>,
    rotation: &Quaternion<f32>,
) {
    node.translation = to_flu_translation(convention, translation);
    node.rotation = to_flu_rotation(convention, rotation);
}
