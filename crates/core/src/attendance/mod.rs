pub mod burst_filter;
pub mod debouncer;
pub mod domain;
pub mod infrastructure;
