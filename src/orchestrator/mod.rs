//! 编排层
//!
//! 顶层流程控制：缓存短路、并发管线调度、批次汇总

pub mod batch_processor;

pub use batch_processor::App;
