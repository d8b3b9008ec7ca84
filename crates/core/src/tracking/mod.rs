pub mod capture_session;
pub mod domain;
pub mod infrastructure;
pub mod spatial_tracker;
