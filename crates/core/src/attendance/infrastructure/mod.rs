pub mod csv_attendance_log;
