// src/pipeline.rs - Reading streams, applying procedures, writing events
pub mod config;
pub mod context;
pub mod processors;
pub mod stream;
