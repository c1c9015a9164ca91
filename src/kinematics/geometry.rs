use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::hand::{HandJoint, HandSnapshot, JointPose};

/// これより短いボーンは角度計算に使わない（メートル）
pub const DEGENERATE_SEGMENT_EPSILON: f32 = 1e-6;

/// 手のひら法線が得られないときのフォールバック（ソース座標系の上方向）
pub const FALLBACK_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// 3関節 A→B→C の符号付き屈曲角（ラジアン）
///
/// 大きさ: (B-A) と (C-B) のなす角 [0, π]
/// 符号: cross(v1, v2)·normal が 0 以上なら正
///
/// 長さ 0 のセグメントは未定義。呼び出し側は [`try_signed_flexion_angle`] を使うこと。
pub fn signed_flexion_angle(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    reference_normal: &Vector3<f32>,
) -> f32 {
    let v1 = (b - a).normalize();
    let v2 = (c - b).normalize();

    let dot = v1.dot(&v2).clamp(-1.0, 1.0);
    let angle = dot.acos();

    let normal = reference_normal
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    let sign = if v1.cross(&v2).dot(&normal) >= 0.0 { 1.0 } else { -1.0 };
    angle * sign
}

/// ボーン長をチェックしてから [`signed_flexion_angle`] を計算
///
/// どちらかのセグメントが [`DEGENERATE_SEGMENT_EPSILON`] 未満なら None
pub fn try_signed_flexion_angle(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    reference_normal: &Vector3<f32>,
) -> Option<f32> {
    if (b - a).norm() < DEGENERATE_SEGMENT_EPSILON || (c - b).norm() < DEGENERATE_SEGMENT_EPSILON {
        return None;
    }
    Some(signed_flexion_angle(a, b, c, reference_normal))
}

/// palm / wrist / middle metacarpal から手のひら法線を推定
///
/// いずれかが欠けている、または3点が一直線なら [`FALLBACK_UP`]
pub fn estimate_palm_normal(hand: &HandSnapshot) -> Vector3<f32> {
    let (palm, wrist, mid_meta) = match (
        hand.position(HandJoint::Palm),
        hand.position(HandJoint::Wrist),
        hand.position(HandJoint::MiddleMetacarpal),
    ) {
        (Some(p), Some(w), Some(m)) => (p, w, m),
        _ => return FALLBACK_UP,
    };

    let a = match (mid_meta - palm).try_normalize(DEGENERATE_SEGMENT_EPSILON) {
        Some(a) => a,
        None => return FALLBACK_UP,
    };
    let b = match (wrist - palm).try_normalize(DEGENERATE_SEGMENT_EPSILON) {
        Some(b) => b,
        None => return FALLBACK_UP,
    };
    a.cross(&b)
        .try_normalize(DEGENERATE_SEGMENT_EPSILON)
        .unwrap_or(FALLBACK_UP)
}

/// 任意のクォータニオンを単位化。ノルムがほぼ 0 なら単位回転
pub fn unit_or_identity(q: &Quaternion<f32>) -> UnitQuaternion<f32> {
    if q.norm() < f32::EPSILON {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::from_quaternion(*q)
    }
}

/// ワールド座標の点をアンカーのローカル座標へ（スケール 1 のアンカーを仮定）
pub fn inverse_transform_point(anchor: &JointPose, point: &Vector3<f32>) -> Vector3<f32> {
    unit_or_identity(&anchor.rotation).inverse_transform_vector(&(point - anchor.position))
}

/// inverse(anchor.rotation) * rotation
///
/// rotation が全 0 のときは結果も全 0 のまま返す（変換後に単位回転へ補正される）
pub fn relative_rotation(anchor: &JointPose, rotation: &Quaternion<f32>) -> Quaternion<f32> {
    unit_or_identity(&anchor.rotation).inverse().into_inner() * rotation
}
