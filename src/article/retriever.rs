use crate::article::extractor::DocumentExtractor;
use crate::error::{NewsCrawlError, Result};
use crate::feed::{source_domain, FeedRecord};
use serde::Serialize;

pub const OUTPUT_COLUMNS: [&str; 5] = ["timestamp", "url", "source", "title", "text"];

/// One row of an interval's output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub timestamp: String,
    pub url: String,
    pub source: String,
    pub title: String,
    pub text: String,
}

pub struct DocumentRetriever {
    extractor: Box<dyn DocumentExtractor + Send>,
}

impl DocumentRetriever {
    pub fn new(extractor: Box<dyn DocumentExtractor + Send>) -> Self {
        Self { extractor }
    }

    /// Fetch the record's article. One attempt; every failure cause becomes
    /// [`NewsCrawlError::DocumentUnavailable`].
    pub fn retrieve(&self, record: &FeedRecord) -> Result<OutputRecord> {
        let url = record.document_identifier();

        let document = self
            .extractor
            .extract(url)
            .map_err(|source| NewsCrawlError::DocumentUnavailable {
                url: url.to_string(),
                source,
            })?;

        Ok(OutputRecord {
            timestamp: record.date().to_string(),
            url: url.to_string(),
            source: source_domain(url),
            title: flatten_title(&document.title),
            text: document.text,
        })
    }
}

fn flatten_title(title: &str) -> String {
    title.replace(['\n', '\t', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{Document, ExtractError};
    use crate::config::FilterConfig;
    use crate::feed::{HeaderSchema, RecordExtractor, RecordFilter};
    use crate::testing::gkg_line;

    struct FixedExtractor(std::result::Result<Document, u16>);

    impl DocumentExtractor for FixedExtractor {
        fn extract(&self, _url: &str) -> std::result::Result<Document, ExtractError> {
            self.0.clone().map_err(ExtractError::Status)
        }
    }

    fn record(url: &str) -> FeedRecord {
        let extractor = RecordExtractor::new(
            HeaderSchema::gkg(),
            RecordFilter::new(&FilterConfig::default()),
        );
        extractor
            .parse_line(&gkg_line(url, "srclc:eng;eng:GT"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_output_record_projection() {
        let retriever = DocumentRetriever::new(Box::new(FixedExtractor(Ok(Document {
            title: "Line one\nline\ttwo".to_string(),
            text: "Body\nwith lines".to_string(),
        }))));

        let row = retriever.retrieve(&record("https://news.a.com/2021/story")).unwrap();

        assert_eq!(row.timestamp, crate::testing::FIXTURE_DATE);
        assert_eq!(row.url, "https://news.a.com/2021/story");
        assert_eq!(row.source, "news.a.com");
        assert_eq!(row.title, "Line one line two");
        assert_eq!(row.text, "Body\nwith lines");
    }

    #[test]
    fn test_failure_is_uniform() {
        let retriever = DocumentRetriever::new(Box::new(FixedExtractor(Err(503))));

        match retriever.retrieve(&record("https://a.com/x")) {
            Err(NewsCrawlError::DocumentUnavailable { url, source }) => {
                assert_eq!(url, "https://a.com/x");
                assert!(matches!(source, ExtractError::Status(503)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
