mod client;
pub mod prompts;

pub use client::LlmClient;
