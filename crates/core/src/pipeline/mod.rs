pub mod controls;
pub mod domain;
pub mod infrastructure;
pub mod pipeline_logger;
