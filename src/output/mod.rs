pub mod batch_writer;
pub mod report;

pub use batch_writer::BatchWriter;
pub use report::{CrawlReport, CrawlSummary, IntervalOutcome, IntervalReport};
