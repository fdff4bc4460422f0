//! Job execution: subprocess supervision for one download, and the
//! fixed-size worker pool that drives it off the queue.

pub mod engine;
pub mod pool;
