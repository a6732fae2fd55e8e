pub mod achievements;
pub mod broadcast;
pub mod engine;
pub mod notify;
pub mod presence;
