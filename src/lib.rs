// Library root - exposes the dispatch core for the console binary,
// integration tests, and richer reply surfaces.
// The binary entry point is src/main.rs.

pub mod agent;
pub mod config;
pub mod entrez;
pub mod error;
pub mod llm;
pub mod logger;
pub mod render;
