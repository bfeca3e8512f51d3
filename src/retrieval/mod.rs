//! Query-time retrieval
//!
//! - Query classifier: cheap greeting detection that decides whether
//!   retrieval runs at all
//! - Payload schema: which payload fields carry text and source labels
//! - Context assembler: embed, search, and format hits into one
//!   source-attributed context string

pub mod classifier;
pub mod context;
pub mod payload;

pub use classifier::is_greeting;
pub use context::{
    ContextAssembler, ContextBlock, RetrievedContext, BLOCK_SEPARATOR, DEFAULT_TOP_K,
    ERROR_PREFIX, NO_RESULTS_CONTEXT,
};
pub use payload::PayloadSchema;
