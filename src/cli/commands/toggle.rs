use crate::cli::commands::print_report;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::engine::Engine;
use crate::errors::AppResult;
use crate::utils::time::parse_optional_claimed;

/// QR-scan flow: the engine picks the direction from current state.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Toggle { system_id, at } = cmd {
        let engine = Engine::open(cfg)?;
        let claimed = parse_optional_claimed(at.as_ref(), engine.clock())?;

        let report = engine.toggle(*system_id, claimed)?;
        print_report(&report, engine.clock());

        engine.close();
    }

    Ok(())
}
