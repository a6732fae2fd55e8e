use crate::cli::commands::print_report;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::engine::Engine;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::CheckOutTarget;
use crate::utils::time::parse_optional_claimed;

/// Manual check-out, by student or by explicit log id.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Out {
        system_id,
        log_id,
        at,
    } = cmd
    {
        let target = match (system_id, log_id) {
            (_, Some(id)) => CheckOutTarget::Log(*id),
            (Some(sid), None) => CheckOutTarget::Student(*sid),
            (None, None) => {
                return Err(AppError::Validation(
                    "provide a student system id or --log <ID>".to_string(),
                ));
            }
        };

        let engine = Engine::open(cfg)?;
        let claimed = parse_optional_claimed(at.as_ref(), engine.clock())?;

        let report = engine.check_out(target, claimed)?;
        print_report(&report, engine.clock());

        engine.close();
    }

    Ok(())
}
