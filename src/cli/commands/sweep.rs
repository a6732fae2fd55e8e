use crate::config::Config;
use crate::core::engine::Engine;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// On-demand forgotten-checkout sweep (init runs the same thing).
pub fn handle(cfg: &Config) -> AppResult<()> {
    let engine = Engine::open(cfg)?;

    let count = engine.sweep_forgotten()?;
    if count == 0 {
        info("No forgotten logs found.");
    } else {
        success(format!("Closed {} forgotten log(s).", count));
    }

    engine.close();
    Ok(())
}
