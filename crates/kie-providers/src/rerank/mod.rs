//! Built-in rerank providers, each registering into
//! [`kie_domain::registry::rerank::RERANK_PROVIDERS`].

mod bailian;
mod default_provider;
mod jina;
mod tei;
mod voyageai;

pub use bailian::BailianRerankProvider;
pub use default_provider::DefaultRerankProvider;
pub use jina::JinaRerankProvider;
pub use tei::TeiRerankProvider;
pub use voyageai::VoyageAiRerankProvider;
