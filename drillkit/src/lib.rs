pub mod cli;
pub mod cms;
pub mod load_config;
pub mod prompt;
pub mod repository;
pub mod revalidate;
pub mod storage;

pub use cli::{run, Cli, Commands};
