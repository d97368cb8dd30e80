pub mod batch;

pub use batch::{BatchConfig, CommandSpec};
