// Resume analysis: PDF extraction, prompt construction, completion, tolerant parsing.
// All model calls go through llm_client::CompletionBackend.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod schema;
