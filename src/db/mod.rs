pub mod achievements;
pub mod initialize;
pub mod journal;
pub mod logs;
pub mod migrate;
pub mod phrases;
pub mod pool;
pub mod queue;
pub mod students;
