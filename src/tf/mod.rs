pub mod convert;
pub mod tree;

pub use convert::{to_flu_rotation, to_flu_translation, Convention};
pub use tree::{joint_frame_name, RefreshStats, TransformTree, TreeInput};
