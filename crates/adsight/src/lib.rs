//! Adsight - Retrieval-augmented insights for advertising reports
//!
//! Summarizes uploaded ad performance tables, enriches the prompt with a
//! platform best practice and a previously generated similar insight, asks a
//! local language model for recommendations, and scores generated text
//! against references with ROUGE and token F1.

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod feedback;
pub mod server;
