use crate::cli::parser::StudentAction;
use crate::config::Config;
use crate::db::journal::shlog;
use crate::db::pool::DbHandle;
use crate::db::students::{self, NewStudent};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use crate::utils::table::{Column, Table};

/// Roster administration. Spreadsheet import is an external concern;
/// this covers registering students one by one and listing the roster.
pub fn handle(action: &StudentAction, cfg: &Config) -> AppResult<()> {
    let db = DbHandle::open(&cfg.database)?;

    match action {
        StudentAction::Add {
            system_id,
            name,
            grade,
            class_number,
            student_number,
            enrollment_year,
            email,
        } => {
            if *system_id <= 0 {
                return Err(AppError::Validation(format!(
                    "system id must be positive, got {}",
                    system_id
                )));
            }
            if name.trim().is_empty() {
                return Err(AppError::Validation("student name is required".to_string()));
            }

            db.with_conn(|conn| {
                if students::find_by_system_id(conn, *system_id)?.is_some() {
                    return Err(AppError::Conflict(format!(
                        "student {} already registered",
                        system_id
                    )));
                }
                students::insert(
                    conn,
                    &NewStudent {
                        system_id: *system_id,
                        enrollment_year: *enrollment_year,
                        grade: *grade,
                        class_number: *class_number,
                        student_number: *student_number,
                        name: name.trim(),
                        guardian_email: email.as_deref().unwrap_or(""),
                    },
                )?;
                shlog(
                    conn,
                    "student",
                    &system_id.to_string(),
                    &format!("Registered student {}", name.trim()),
                )?;
                Ok(())
            })?;

            success(format!("Registered {} (system id {}).", name.trim(), system_id));
        }

        StudentAction::List => {
            let roster = db.with_conn(|conn| students::list_all(conn))?;
            if roster.is_empty() {
                warning("No students registered yet.");
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column { header: "SysID".to_string(), width: 8 },
                Column { header: "Name".to_string(), width: 20 },
                Column { header: "Grade".to_string(), width: 5 },
                Column { header: "Class".to_string(), width: 5 },
                Column { header: "No.".to_string(), width: 4 },
                Column { header: "Present".to_string(), width: 7 },
                Column { header: "Title".to_string(), width: 14 },
            ]);

            for s in &roster {
                table.add_row(vec![
                    s.system_id.to_string(),
                    s.name.clone(),
                    s.grade.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string()),
                    s.class_number.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                    s.student_number.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
                    if s.is_present { "yes" } else { "-" }.to_string(),
                    s.title.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }

            println!("📋 Roster ({} students):", roster.len());
            println!();
            print!("{}", table.render());
        }
    }

    Ok(())
}
