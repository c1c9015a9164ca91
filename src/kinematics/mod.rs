pub mod geometry;
pub mod mapper;

pub use geometry::{estimate_palm_normal, signed_flexion_angle, try_signed_flexion_angle};
pub use mapper::{mapper_from_config, AngleVector, FlexionMapper, JointAngle, SkeletonMapper};
