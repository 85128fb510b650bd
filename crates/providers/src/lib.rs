//! LLM client implementations for Confidant.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;
