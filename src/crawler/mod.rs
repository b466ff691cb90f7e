pub mod orchestrator;

pub use orchestrator::{CrawlProgress, IntervalOrchestrator};
