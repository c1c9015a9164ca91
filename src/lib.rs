pub mod config;
pub mod error;
pub mod hand;
pub mod kinematics;
pub mod messages;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod tf;
pub mod transport;
pub mod visibility;
