//! Wire types for the OpenAI-style endpoints the shim serves.

pub mod chat;
pub mod embeddings;
