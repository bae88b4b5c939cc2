//! Built-in embedding providers. Each module registers itself into
//! [`kie_domain::registry::embedding::EMBEDDING_PROVIDERS`] via `#[linkme::distributed_slice]`;
//! importing this module (transitively, through [`crate::lib`]) is enough to make every
//! provider here resolvable by id.

mod ollama;
mod openai;
mod openai_compatible;

pub use ollama::OllamaEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use openai_compatible::OpenAiCompatibleEmbeddingProvider;
