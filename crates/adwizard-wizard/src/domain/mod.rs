//! Pure wizard state: step sequences, completion flags, notices.

pub mod gate;
pub mod notices;
pub mod state;
pub mod steps;
