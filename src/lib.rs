pub mod config;
pub mod error;
pub mod renumber_engine;
