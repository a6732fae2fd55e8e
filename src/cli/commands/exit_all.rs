use crate::config::Config;
use crate::core::engine::Engine;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Close every today-dated open log in one batch.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let engine = Engine::open(cfg)?;

    let count = engine.bulk_exit()?;
    if count == 0 {
        info("No students to check out.");
    } else {
        success(format!("Checked out {} student(s).", count));
    }

    engine.close();
    Ok(())
}
