pub mod attendance_log;
pub mod remote_sink;
