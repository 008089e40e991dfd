mod app;
mod cli;
pub mod logging;
mod persistence;

pub use app::run_app;
pub use cli::Cli;
