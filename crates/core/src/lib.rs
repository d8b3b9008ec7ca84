pub mod attendance;
pub mod perception;
pub mod pipeline;
pub mod shared;
pub mod tracking;
