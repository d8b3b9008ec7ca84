pub mod decimated_perception;
pub mod null_perception;
