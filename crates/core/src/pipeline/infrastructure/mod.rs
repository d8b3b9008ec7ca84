pub mod synthetic_frame_source;
pub mod threaded_pipeline;
