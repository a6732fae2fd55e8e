use crate::cli::commands::print_report;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::engine::Engine;
use crate::errors::AppResult;
use crate::utils::time::parse_optional_claimed;

/// Manual check-in from the front desk terminal.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::In {
        system_id,
        seat,
        at,
    } = cmd
    {
        let engine = Engine::open(cfg)?;
        let claimed = parse_optional_claimed(at.as_ref(), engine.clock())?;

        let report = engine.check_in(*system_id, *seat, claimed)?;
        print_report(&report, engine.clock());

        engine.close();
    }

    Ok(())
}
