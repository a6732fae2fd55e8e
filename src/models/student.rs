use serde::Serialize;

/// A student row. Created by roster administration, mutated on every
/// presence event, never deleted by the core.
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: i64,
    pub system_id: i64,         // ⇔ students.system_id (UNIQUE, stable identity)
    pub enrollment_year: Option<i64>,
    pub grade: Option<i64>,
    pub class_number: Option<i64>,
    pub student_number: Option<i64>,
    pub name: String,
    pub guardian_email: String, // empty = no guardian notifications
    pub is_present: bool,
    pub current_log_id: Option<i64>,
    pub title: Option<String>,  // earned rank title, upgrades only
    pub last_phrase_id: i64,    // rotation cursor into the phrase deck
}
