//! Content readers: one [`kie_domain::ports::ContentReader`] implementation per
//! [`kie_domain::value_objects::KnowledgeItemKind`]. Unlike the provider registries,
//! readers aren't auto-registered — the composition root wires exactly one reader per
//! kind into the knowledge processor.

mod chunker;
mod directory;
mod file;
mod html_extract;
mod loaders;
mod markdown;
mod note;
mod sitemap;
mod url;

pub use directory::DirectoryReader;
pub use file::FileReader;
pub use note::NoteReader;
pub use sitemap::SitemapReader;
pub use url::UrlReader;
