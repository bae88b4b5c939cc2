//! DDL for a single base's vector table. Each base gets its own SQLite file, so there
//! is no multi-tenant column and no migration history to track.

pub(super) const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS vector_rows (
    node_id TEXT PRIMARY KEY,
    external_id TEXT NOT NULL,
    text TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    embedding_blob BLOB NOT NULL,
    dims INTEGER NOT NULL
)";

pub(super) const CREATE_EXTERNAL_ID_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_vector_rows_external_id ON vector_rows(external_id)";
