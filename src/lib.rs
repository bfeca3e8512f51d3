//! Backend Oracle - documentation-grounded chat backend
//!
//! Answers developer questions with a local LLM, grounding each answer in
//! passages retrieved from a vector index of backend documentation.
//!
//! # Architecture
//!
//! - **embedding**: text to dense vectors (local sentence encoder)
//! - **vector_index**: nearest-neighbor search over stored passages
//! - **retrieval**: greeting classifier and context assembly
//! - **chat**: prompt construction and the completion client
//! - **server**: HTTP API

pub mod errors;
pub mod config;
pub mod logging;

pub use errors::{RagError, Result};

pub mod embedding;
pub mod vector_index;
pub mod services;
pub mod retrieval;
pub mod chat;

pub mod server;
pub mod cli;
pub mod doctor;
