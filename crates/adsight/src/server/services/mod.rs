pub mod agent;
pub mod embeddings;
pub mod insight_generator;
pub mod knowledge;
pub mod llm;
pub mod memory_store;
pub mod similarity;
pub mod summarizer;
pub mod vector_database;

#[cfg(feature = "lancedb")]
pub mod lancedb;

#[cfg(feature = "onnx")]
pub mod onnx;
