//! quizforge-core: question sampling, answer checking and quiz sessions.
//!
//! This crate holds the data model, the question-bank loaders, the grading
//! pipeline (MCQ answer resolution and keyword-based free-response marking)
//! and the timed session state machine that the quizforge CLI drives.

pub mod checker;
pub mod config;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod evaluator;
pub mod generated;
pub mod keywords;
pub mod mock;
pub mod model;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod sampler;
pub mod session;
pub mod statistics;
pub mod traits;

#[cfg(test)]
mod fixtures;
