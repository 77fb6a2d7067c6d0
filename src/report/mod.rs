//! Report module - terminal summary and file exports of a ranking run

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
