use crate::article::{DocumentRetriever, HtmlDocumentExtractor};
use crate::config::Config;
use crate::error::{NewsCrawlError, Result};
use crate::feed::{batch_source_for, BatchSource, HeaderSchema, RecordExtractor, RecordFilter};
use crate::output::{BatchWriter, CrawlReport, IntervalOutcome, IntervalReport};
use crate::schedule::Interval;
use crate::ui::GracefulShutdown;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct CrawlProgress {
    pub intervals_processed: usize,
    pub total_intervals: usize,
    pub current_interval: Option<String>,
    pub records_processed: usize,
    pub records_total: usize,
    pub rows_written: usize,
    pub start_time: Instant,
}

impl CrawlProgress {
    pub fn new(total_intervals: usize) -> Self {
        Self {
            intervals_processed: 0,
            total_intervals,
            current_interval: None,
            records_processed: 0,
            records_total: 0,
            rows_written: 0,
            start_time: Instant::now(),
        }
    }

    fn start_interval(&mut self, interval: &Interval) {
        self.current_interval = Some(interval.timestamp());
        self.records_processed = 0;
        self.records_total = 0;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.intervals_processed == 0 {
            return Duration::ZERO;
        }

        let per_interval = self.elapsed().as_secs_f64() / self.intervals_processed as f64;
        let remaining = self.total_intervals.saturating_sub(self.intervals_processed);
        Duration::from_secs_f64(per_interval * remaining as f64)
    }
}

type ProgressCallback<'a> = Option<&'a dyn Fn(&CrawlProgress)>;

pub struct IntervalOrchestrator {
    out_dir: PathBuf,
    tmp_dir: PathBuf,
    source: Box<dyn BatchSource + Send>,
    extractor: RecordExtractor,
    retriever: DocumentRetriever,
}

impl IntervalOrchestrator {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        tmp_dir: impl Into<PathBuf>,
        source: Box<dyn BatchSource + Send>,
        extractor: RecordExtractor,
        retriever: DocumentRetriever,
    ) -> Self {
        Self {
            out_dir: out_dir.into(),
            tmp_dir: tmp_dir.into(),
            source,
            extractor,
            retriever,
        }
    }

    /// Wire the network-backed batch source and article extractor from `config`.
    pub fn from_config(config: &Config, schema: HeaderSchema) -> Result<Self> {
        let source = batch_source_for(&config.feed)?;
        let extractor = RecordExtractor::new(schema, RecordFilter::new(&config.filters));
        let retriever = DocumentRetriever::new(Box::new(HtmlDocumentExtractor::new(&config.article)?));

        Ok(Self::new(
            &config.output.out_dir,
            &config.output.tmp_dir,
            source,
            extractor,
            retriever,
        ))
    }

    pub fn output_path(&self, interval: &Interval) -> PathBuf {
        self.out_dir.join(interval.output_file_name())
    }

    /// Process `intervals` in order. A requested shutdown is honoured before
    /// the next interval starts, never in the middle of one.
    pub fn run<I>(
        &self,
        intervals: I,
        total_intervals: usize,
        shutdown: Option<&GracefulShutdown>,
        progress_callback: ProgressCallback<'_>,
    ) -> CrawlReport
    where
        I: IntoIterator<Item = Interval>,
    {
        let mut report = CrawlReport::new();
        let mut progress = CrawlProgress::new(total_intervals);

        for interval in intervals {
            if shutdown.is_some_and(|s| !s.is_running()) {
                warn!("crawl cancelled before interval {}", interval.timestamp());
                report.cancelled = true;
                break;
            }

            let interval_report = self.process_interval(&interval, &mut progress, progress_callback);
            report.push(interval_report);

            progress.intervals_processed += 1;
            if let Some(callback) = progress_callback {
                callback(&progress);
            }
        }

        report.duration = progress.elapsed();
        info!(
            intervals = report.summary.intervals_total,
            rows = report.summary.rows_written,
            failures = report.summary.retrieval_failures,
            "crawl finished"
        );
        report
    }

    pub fn process_interval(
        &self,
        interval: &Interval,
        progress: &mut CrawlProgress,
        progress_callback: ProgressCallback<'_>,
    ) -> IntervalReport {
        progress.start_interval(interval);
        if let Some(callback) = progress_callback {
            callback(&*progress);
        }

        let mut malformed_lines = 0;
        let outcome = match self.try_process(interval, &mut malformed_lines, progress, progress_callback) {
            Ok(outcome) => outcome,
            Err(NewsCrawlError::BatchMissing { url }) => {
                warn!("data file not found: {}", url);
                IntervalOutcome::BatchMissing
            }
            Err(e) => {
                error!("interval {} failed: {}", interval.timestamp(), e);
                IntervalOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        IntervalReport {
            timestamp: interval.timestamp(),
            outcome,
            malformed_lines,
        }
    }

    fn try_process(
        &self,
        interval: &Interval,
        malformed_lines: &mut usize,
        progress: &mut CrawlProgress,
        progress_callback: ProgressCallback<'_>,
    ) -> Result<IntervalOutcome> {
        let destination = self.output_path(interval);
        if destination.exists() {
            debug!("{} already exists, skipping", destination.display());
            return Ok(IntervalOutcome::AlreadyCompleted);
        }

        info!(
            "processing interval {} from {}",
            interval.timestamp(),
            self.source.locate(interval)
        );

        let batch = {
            let archive = tempfile::Builder::new()
                .prefix(&format!("{}-", interval.timestamp()))
                .suffix(".zip")
                .tempfile_in(&self.tmp_dir)?;

            self.source.fetch(interval, archive.path())?;
            self.extractor.extract(archive.path())?
        };
        *malformed_lines = batch.malformed.len();

        progress.records_total = batch.records.len();
        let mut writer = BatchWriter::create(&destination)?;
        let mut failures = 0;

        for record in &batch.records {
            match self.retriever.retrieve(record) {
                Ok(row) => {
                    writer.write(&row)?;
                    progress.rows_written += 1;
                }
                Err(NewsCrawlError::DocumentUnavailable { url, source }) => {
                    failures += 1;
                    error!("cannot retrieve {}: {}", url, source);
                }
                Err(e) => return Err(e),
            }

            progress.records_processed += 1;
            if let Some(callback) = progress_callback {
                callback(&*progress);
            }
        }

        let rows = writer.rows_written();
        match writer.finish()? {
            Some(path) => {
                info!(
                    "wrote {} rows to {} ({} retrieval failures)",
                    rows,
                    path.display(),
                    failures
                );
                Ok(IntervalOutcome::Written { rows, failures })
            }
            None => {
                info!(
                    "interval {} produced no rows ({} records, {} retrieval failures)",
                    interval.timestamp(),
                    batch.records.len(),
                    failures
                );
                Ok(IntervalOutcome::Empty {
                    records: batch.records.len(),
                    failures,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{Document, DocumentExtractor, ExtractError};
    use crate::config::{FilterConfig, LoggingConfig};
    use crate::logging;
    use crate::testing::{gkg_line, write_batch};
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Serves fixture archives keyed by timestamp and counts every fetch.
    struct FixtureSource {
        batches: HashMap<String, PathBuf>,
        fetches: Arc<AtomicUsize>,
        broken: bool,
    }

    impl BatchSource for FixtureSource {
        fn locate(&self, interval: &Interval) -> String {
            format!("fixture://{}", interval.timestamp())
        }

        fn fetch(&self, interval: &Interval, destination: &Path) -> Result<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(NewsCrawlError::Transport {
                    url: self.locate(interval),
                    message: "connection reset".to_string(),
                });
            }
            match self.batches.get(&interval.timestamp()) {
                Some(path) => {
                    fs::copy(path, destination)?;
                    Ok(())
                }
                None => Err(NewsCrawlError::BatchMissing {
                    url: self.locate(interval),
                }),
            }
        }
    }

    /// Known URLs yield a document; everything else fails.
    struct PageStore(HashMap<String, Document>);

    impl DocumentExtractor for PageStore {
        fn extract(&self, url: &str) -> std::result::Result<Document, ExtractError> {
            self.0.get(url).cloned().ok_or(ExtractError::Status(404))
        }
    }

    struct Fixture {
        _root: TempDir,
        fixtures: PathBuf,
        out_dir: PathBuf,
        tmp_dir: PathBuf,
        batches: HashMap<String, PathBuf>,
        pages: HashMap<String, Document>,
        fetches: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let fixtures = root.path().join("fixtures");
            let out_dir = root.path().join("out");
            let tmp_dir = root.path().join("tmp");
            for dir in [&fixtures, &out_dir, &tmp_dir] {
                fs::create_dir_all(dir).unwrap();
            }

            Self {
                _root: root,
                fixtures,
                out_dir,
                tmp_dir,
                batches: HashMap::new(),
                pages: HashMap::new(),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn batch(&mut self, interval: &Interval, lines: &[String]) {
            let name = format!("{}.zip", interval.timestamp());
            let path = write_batch(&self.fixtures, &name, lines);
            self.batches.insert(interval.timestamp(), path);
        }

        fn page(&mut self, url: &str, title: &str) {
            self.pages.insert(
                url.to_string(),
                Document {
                    title: title.to_string(),
                    text: format!("Body of {}", title),
                },
            );
        }

        fn orchestrator(&self, sources: &[&str]) -> IntervalOrchestrator {
            self.build(sources, false)
        }

        fn build(&self, sources: &[&str], broken: bool) -> IntervalOrchestrator {
            let filter = RecordFilter::new(&FilterConfig {
                sources: sources.iter().map(|s| s.to_string()).collect(),
                languages: vec!["eng".to_string()],
            });
            let source = FixtureSource {
                batches: self.batches.clone(),
                fetches: self.fetches.clone(),
                broken,
            };

            IntervalOrchestrator::new(
                &self.out_dir,
                &self.tmp_dir,
                Box::new(source),
                RecordExtractor::new(HeaderSchema::gkg(), filter),
                DocumentRetriever::new(Box::new(PageStore(self.pages.clone()))),
            )
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn tmp_is_empty(&self) -> bool {
            fs::read_dir(&self.tmp_dir).unwrap().next().is_none()
        }
    }

    fn at(minute: u32) -> Interval {
        Interval::new(2021, 3, 5, 7, minute).unwrap()
    }

    fn eng(url: &str) -> String {
        gkg_line(url, "srclc:eng;eng:GT")
    }

    fn run(orchestrator: &IntervalOrchestrator, intervals: Vec<Interval>) -> CrawlReport {
        let total = intervals.len();
        orchestrator.run(intervals, total, None, None)
    }

    #[test]
    fn test_rerun_skips_completed_intervals() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(0), &[eng("https://a.com/1"), eng("https://a.com/2")]);
        fixture.batch(&at(15), &[eng("https://a.com/3")]);
        for (url, title) in [("https://a.com/1", "One"), ("https://a.com/2", "Two"), ("https://a.com/3", "Three")] {
            fixture.page(url, title);
        }

        let orchestrator = fixture.orchestrator(&[]);
        let first = run(&orchestrator, vec![at(0), at(15)]);
        assert_eq!(fixture.fetches(), 2);
        assert_eq!(first.summary.intervals_written, 2);
        assert_eq!(first.summary.rows_written, 3);

        let before = fs::read(orchestrator.output_path(&at(0))).unwrap();

        let second = run(&orchestrator, vec![at(0), at(15)]);
        assert_eq!(fixture.fetches(), 2);
        assert_eq!(second.summary.intervals_skipped, 2);
        assert_eq!(
            second.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::AlreadyCompleted)
        );
        assert_eq!(fs::read(orchestrator.output_path(&at(0))).unwrap(), before);
    }

    #[test]
    fn test_filtered_out_interval_leaves_no_file() {
        let mut fixture = Fixture::new();
        fixture.batch(
            &at(0),
            &[eng("https://b.com/1"), gkg_line("https://a.com/2", "srclc:fra;eng:GT")],
        );
        fixture.page("https://b.com/1", "Elsewhere");

        let orchestrator = fixture.orchestrator(&["a.com"]);
        let report = run(&orchestrator, vec![at(0)]);

        assert_eq!(
            report.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::Empty { records: 0, failures: 0 })
        );
        assert!(!orchestrator.output_path(&at(0)).exists());
        assert_eq!(fs::read_dir(&fixture.out_dir).unwrap().count(), 0);
        assert!(fixture.tmp_is_empty());
    }

    #[test]
    fn test_all_retrievals_failing_leaves_no_file() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(0), &[eng("https://a.com/1"), eng("https://a.com/2")]);

        let orchestrator = fixture.orchestrator(&[]);
        let report = run(&orchestrator, vec![at(0)]);

        assert_eq!(
            report.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::Empty { records: 2, failures: 2 })
        );
        assert_eq!(report.summary.retrieval_failures, 2);
        assert!(!orchestrator.output_path(&at(0)).exists());
        assert!(!report.has_failures());
    }

    #[test]
    fn test_failed_record_does_not_stop_interval() {
        let mut fixture = Fixture::new();
        fixture.batch(
            &at(0),
            &[eng("https://a.com/1"), eng("https://a.com/2"), eng("https://a.com/3")],
        );
        fixture.page("https://a.com/1", "First");
        fixture.page("https://a.com/3", "Third");

        let orchestrator = fixture.orchestrator(&[]);
        let report = run(&orchestrator, vec![at(0)]);

        assert_eq!(
            report.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::Written { rows: 2, failures: 1 })
        );

        let content = fs::read_to_string(orchestrator.output_path(&at(0))).unwrap();
        assert_eq!(content.matches("timestamp,url,source,title,text").count(), 1);

        let mut reader = csv::Reader::from_path(orchestrator.output_path(&at(0))).unwrap();
        let urls: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(urls, vec!["https://a.com/1", "https://a.com/3"]);
    }

    #[test]
    fn test_missing_batch_is_skipped() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(15), &[eng("https://a.com/1")]);
        fixture.page("https://a.com/1", "One");

        let orchestrator = fixture.orchestrator(&[]);
        let report = run(&orchestrator, vec![at(0), at(15)]);

        assert_eq!(
            report.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::BatchMissing)
        );
        assert!(!orchestrator.output_path(&at(0)).exists());
        assert!(orchestrator.output_path(&at(15)).exists());
        assert!(!report.has_failures());
        assert!(fixture.tmp_is_empty());
    }

    #[test]
    fn test_malformed_lines_are_counted() {
        let mut fixture = Fixture::new();
        fixture.batch(
            &at(0),
            &[eng("https://a.com/1"), "too\tfew\tfields".to_string(), eng("https://a.com/2")],
        );
        fixture.page("https://a.com/1", "One");
        fixture.page("https://a.com/2", "Two");

        let orchestrator = fixture.orchestrator(&[]);
        let report = run(&orchestrator, vec![at(0)]);

        assert_eq!(report.intervals[0].malformed_lines, 1);
        assert_eq!(report.summary.rows_written, 2);
    }

    #[test]
    fn test_parse_and_retrieval_errors_are_logged_once() {
        let mut fixture = Fixture::new();
        fixture.batch(
            &at(0),
            &[
                eng("https://a.com/1"),
                "broken line".to_string(),
                eng("https://a.com/2"),
                eng("https://a.com/3"),
            ],
        );
        fixture.page("https://a.com/1", "First");
        fixture.page("https://a.com/3", "Third");

        let logging = LoggingConfig {
            file: fixture.fixtures.join("crawl.log"),
            level: "info".to_string(),
        };
        let orchestrator = fixture.orchestrator(&[]);
        let subscriber = logging::file_subscriber(&logging).unwrap();
        let report = tracing::subscriber::with_default(subscriber, || run(&orchestrator, vec![at(0)]));

        assert_eq!(
            report.outcome_of(&at(0).timestamp()),
            Some(&IntervalOutcome::Written { rows: 2, failures: 1 })
        );

        let log = fs::read_to_string(&logging.file).unwrap();
        let parse_errors: Vec<&str> = log
            .lines()
            .filter(|line| line.contains("cannot parse line in file"))
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert!(parse_errors[0].contains("ERROR"));
        assert!(parse_errors[0].contains("broken line"));

        let retrieval_errors: Vec<&str> = log
            .lines()
            .filter(|line| line.contains("cannot retrieve"))
            .collect();
        assert_eq!(retrieval_errors.len(), 1);
        assert!(retrieval_errors[0].contains("ERROR"));
        assert!(retrieval_errors[0].contains("cannot retrieve https://a.com/2: server answered 404"));
    }

    #[test]
    fn test_transport_failure_fails_interval_only() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(0), &[eng("https://a.com/1")]);

        let orchestrator = fixture.build(&[], true);
        let report = run(&orchestrator, vec![at(0), at(15)]);

        assert_eq!(report.summary.intervals_failed, 2);
        assert!(report.has_failures());
        assert_eq!(report.errors.len(), 2);
        assert!(!orchestrator.output_path(&at(0)).exists());
        assert!(fixture.tmp_is_empty());
    }

    #[test]
    fn test_shutdown_stops_between_intervals() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(0), &[eng("https://a.com/1")]);
        fixture.batch(&at(15), &[eng("https://a.com/2")]);
        fixture.page("https://a.com/1", "One");
        fixture.page("https://a.com/2", "Two");

        let orchestrator = fixture.orchestrator(&[]);
        let shutdown = GracefulShutdown::new_for_test();
        let stop_after_first = |progress: &CrawlProgress| {
            if progress.intervals_processed == 1 {
                shutdown.request_shutdown();
            }
        };

        let report = orchestrator.run(vec![at(0), at(15)], 2, Some(&shutdown), Some(&stop_after_first));

        assert!(report.cancelled);
        assert_eq!(report.intervals.len(), 1);
        assert_eq!(fixture.fetches(), 1);
        assert!(orchestrator.output_path(&at(0)).exists());
        assert!(!orchestrator.output_path(&at(15)).exists());
    }

    #[test]
    fn test_progress_reports_records() {
        let mut fixture = Fixture::new();
        fixture.batch(&at(0), &[eng("https://a.com/1"), eng("https://a.com/2")]);
        fixture.page("https://a.com/1", "One");

        let orchestrator = fixture.orchestrator(&[]);
        let seen = std::cell::RefCell::new(Vec::new());
        let record = |progress: &CrawlProgress| {
            seen.borrow_mut()
                .push((progress.records_processed, progress.records_total));
        };

        orchestrator.run(vec![at(0)], 1, None, Some(&record));

        let seen = seen.into_inner();
        assert!(seen.contains(&(1, 2)));
        assert!(seen.contains(&(2, 2)));
    }
}
