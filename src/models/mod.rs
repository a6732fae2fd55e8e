pub mod achievement;
pub mod attendance;
pub mod phrase;
pub mod queued;
pub mod student;
