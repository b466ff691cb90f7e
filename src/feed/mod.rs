pub mod fetcher;
pub mod records;
pub mod schema;

pub use fetcher::{batch_source_for, BatchSource, HttpBatchSource, LocalBatchSource};
pub use records::{source_domain, ExtractedBatch, FeedRecord, RecordExtractor, RecordFilter};
pub use schema::HeaderSchema;
