mod args;
mod commands;
mod printer;
mod repl;
pub(crate) mod theme;
mod timeline;

pub use args::CliArgs;
pub use repl::{AppState, Mode, prompt_for, run_repl};
