//! Infrastructure layer: record storage (in-memory, Postgres) and ingestion of
//! extraction exports.

pub mod ingest;
pub mod record_store;

pub use ingest::{ingest_documents, ingest_file, IngestError, IngestReport};
pub use record_store::{
    InMemoryRecordStore, PostgresRecordStore, RecordStore, RecordWriter, StoreError,
};
