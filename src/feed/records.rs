use crate::config::FilterConfig;
use crate::error::{NewsCrawlError, Result};
use crate::feed::schema::HeaderSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error};
use zip::ZipArchive;

static SCHEME_OR_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^[A-Za-z][A-Za-z0-9+.\-]*://)|/.*$").expect("static pattern is valid")
});

/// Host part of a document identifier: leading `scheme://` and everything
/// from the first `/` onward are removed.
pub fn source_domain(url: &str) -> String {
    SCHEME_OR_PATH.replace_all(url, "").into_owned()
}

/// A batch line that survived the allow-list checks.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    fields: HashMap<String, String>,
    date: String,
    document_identifier: String,
    domain: String,
    original_language: String,
    translated_language: String,
}

impl FeedRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn document_identifier(&self) -> &str {
        &self.document_identifier
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn original_language(&self) -> &str {
        &self.original_language
    }

    pub fn translated_language(&self) -> &str {
        &self.translated_language
    }
}

/// Source and language allow-lists.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    sources: HashSet<String>,
    languages: HashSet<String>,
}

impl RecordFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            sources: config.sources.iter().cloned().collect(),
            languages: config.languages.iter().cloned().collect(),
        }
    }

    /// An empty source list admits every domain; the language list always applies.
    pub fn admits(&self, domain: &str, original_language: &str) -> bool {
        if !self.sources.is_empty() && !self.sources.contains(domain) {
            return false;
        }
        self.languages.contains(original_language)
    }
}

/// Records kept from one batch, plus the lines that could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct ExtractedBatch {
    pub records: Vec<FeedRecord>,
    pub lines_read: usize,
    pub malformed: Vec<String>,
}

impl ExtractedBatch {
    pub fn filtered_out(&self) -> usize {
        self.lines_read - self.records.len() - self.malformed.len()
    }
}

pub struct RecordExtractor {
    schema: HeaderSchema,
    filter: RecordFilter,
}

impl RecordExtractor {
    pub fn new(schema: HeaderSchema, filter: RecordFilter) -> Self {
        Self { schema, filter }
    }

    pub fn extract(&self, batch_path: &Path) -> Result<ExtractedBatch> {
        let file = File::open(batch_path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let entry = archive.by_index(0)?;
        let mut reader = BufReader::new(entry);

        let mut batch = ExtractedBatch::default();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }

            let line = decode_latin1(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            batch.lines_read += 1;

            match self.parse_line(line) {
                Ok(Some(record)) => batch.records.push(record),
                Ok(None) => {}
                Err(e) => {
                    error!(
                        "cannot parse line in file {}: {} ({})",
                        batch_path.display(),
                        line,
                        e
                    );
                    batch.malformed.push(line.to_string());
                }
            }
        }

        debug!(
            batch = %batch_path.display(),
            lines = batch.lines_read,
            kept = batch.records.len(),
            malformed = batch.malformed.len(),
            "batch extracted"
        );

        Ok(batch)
    }

    /// `Ok(None)` means the line is well formed but rejected by the allow-lists.
    pub fn parse_line(&self, line: &str) -> Result<Option<FeedRecord>> {
        let values: Vec<&str> = line.split('\t').collect();
        if values.len() != self.schema.len() {
            return Err(NewsCrawlError::MalformedLine {
                reason: format!(
                    "expected {} fields, found {}",
                    self.schema.len(),
                    values.len()
                ),
            });
        }

        let translation_info = values[self.schema.translation_info_position()];
        let (original_language, translated_language) = parse_translation_info(translation_info)?;

        let document_identifier = values[self.schema.document_identifier_position()];
        let domain = source_domain(document_identifier);

        if !self.filter.admits(&domain, original_language) {
            return Ok(None);
        }

        let fields = self
            .schema
            .names()
            .iter()
            .cloned()
            .zip(values.iter().map(|v| v.to_string()))
            .collect();

        Ok(Some(FeedRecord {
            fields,
            date: values[self.schema.date_position()].to_string(),
            document_identifier: document_identifier.to_string(),
            domain,
            original_language: original_language.to_string(),
            translated_language: translated_language.to_string(),
        }))
    }
}

/// Split `<tag>:<orig>;<translated>:<engine>` into the two language codes.
fn parse_translation_info(value: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = value.split(':').collect();
    let [_, languages, _] = parts.as_slice() else {
        return Err(NewsCrawlError::MalformedLine {
            reason: format!("translation info has {} parts: {:?}", parts.len(), value),
        });
    };

    match languages.split(';').collect::<Vec<_>>().as_slice() {
        [original, translated] => Ok((*original, *translated)),
        _ => Err(NewsCrawlError::MalformedLine {
            reason: format!("cannot read languages from {:?}", languages),
        }),
    }
}

// The feed is not valid UTF-8; every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
