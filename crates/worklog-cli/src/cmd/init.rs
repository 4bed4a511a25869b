//! `wl init` — initialize a worklog repository.

use std::path::Path;

use worklog_core::WorklogStore;

use crate::output::{OutputMode, fail, render_success};

pub fn run_init(repo: &Path, output: OutputMode) -> anyhow::Result<()> {
    match WorklogStore::open(repo) {
        Ok(_) => {
            render_success(
                output,
                &format!("worklog repository ready at {}", repo.display()),
            )?;
            Ok(())
        }
        Err(e) => Err(fail(output, e)),
    }
}
