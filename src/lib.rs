pub mod config;
pub mod engine;
pub mod toolchain;
pub mod ui;
pub mod workflow;
