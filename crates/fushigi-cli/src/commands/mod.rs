pub mod common;
pub mod grammar;
pub mod journal;
pub mod sentences;
pub mod status;
pub mod sync;
