pub mod joint;
pub mod snapshot;

pub use joint::{HandJoint, Side};
pub use snapshot::{HandSnapshot, JointPose};
