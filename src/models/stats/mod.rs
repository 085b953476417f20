pub mod log_stats;
