//! One module per subcommand: an `Args` struct plus a `run_*` entry point.

pub mod completions;
pub mod create;
pub mod delete;
pub mod history;
pub mod init;
pub mod list;
pub mod meeting;
pub mod monitor;
pub mod show;
pub mod status;
pub mod update;
