pub mod app;
pub mod cli;
pub mod common;

pub use app::Application;
pub use cli::{Cli, Commands};
pub use common::{exit_code, init_logging, load_config};
