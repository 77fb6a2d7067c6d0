//! hirank: Candidate Ranking Library
//!
//! Ranks job candidates by predicted approval probability. Raw application
//! records are encoded into match features, pruned of redundant columns and
//! fed to several classifiers; the one with the best held-out ROC-AUC wins.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
