//! Benchmark categories

pub mod build;
pub mod multi_thread;
pub mod single_thread;
