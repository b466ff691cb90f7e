use crate::error::{NewsCrawlError, Result};
use std::collections::HashSet;
use std::path::Path;

pub const DATE: &str = "DATE";
pub const DOCUMENT_IDENTIFIER: &str = "DocumentIdentifier";
pub const TRANSLATION_INFO: &str = "TranslationInfo";

/// Column order of the GDELT 2.1 Global Knowledge Graph files.
pub const GKG_HEADERS: [&str; 27] = [
    "GKGRECORDID",
    "DATE",
    "SourceCollectionIdentifier",
    "SourceCommonName",
    "DocumentIdentifier",
    "Counts",
    "V2Counts",
    "Themes",
    "V2Themes",
    "Locations",
    "V2Locations",
    "Persons",
    "V2Persons",
    "Organizations",
    "V2Organizations",
    "V2Tone",
    "Dates",
    "GCAM",
    "SharingImage",
    "RelatedImages",
    "SocialImageEmbeds",
    "SocialVideoEmbeds",
    "Quotations",
    "AllNames",
    "Amounts",
    "TranslationInfo",
    "Extras",
];

/// Static list of batch column names, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSchema {
    names: Vec<String>,
    date: usize,
    document_identifier: usize,
    translation_info: usize,
}

impl HeaderSchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(NewsCrawlError::HeaderSchema {
                message: "header list is empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(NewsCrawlError::HeaderSchema {
                message: format!("duplicate column name: {}", duplicate),
            });
        }

        let position = |wanted: &str| {
            names
                .iter()
                .position(|name| name == wanted)
                .ok_or_else(|| NewsCrawlError::HeaderSchema {
                    message: format!("missing required column: {}", wanted),
                })
        };

        let date = position(DATE)?;
        let document_identifier = position(DOCUMENT_IDENTIFIER)?;
        let translation_info = position(TRANSLATION_INFO)?;

        Ok(Self {
            names,
            date,
            document_identifier,
            translation_info,
        })
    }

    pub fn gkg() -> Self {
        Self {
            names: GKG_HEADERS.iter().map(|s| s.to_string()).collect(),
            date: 1,
            document_identifier: 4,
            translation_info: 25,
        }
    }

    /// Read one column name per line; blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| NewsCrawlError::HeaderSchema {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self::new(names)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::gkg()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn date_position(&self) -> usize {
        self.date
    }

    pub fn document_identifier_position(&self) -> usize {
        self.document_identifier
    }

    pub fn translation_info_position(&self) -> usize {
        self.translation_info
    }
}

impl Default for HeaderSchema {
    fn default() -> Self {
        Self::gkg()
    }
}
