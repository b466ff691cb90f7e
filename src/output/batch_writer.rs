use crate::article::{OutputRecord, OUTPUT_COLUMNS};
use crate::error::{NewsCrawlError, Result};
use csv::WriterBuilder;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name prefix of rows staged for an unfinished interval.
pub const STAGED_PREFIX: &str = ".partial-";

/// The destination only appears once [`BatchWriter::finish`] has seen a row.
pub struct BatchWriter {
    destination: PathBuf,
    writer: csv::Writer<NamedTempFile>,
    rows_written: usize,
}

impl BatchWriter {
    pub fn create<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(".csv");
        // Same mode as a plainly created file: 0666 less the umask.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let staged = builder.tempfile_in(&parent)?;

        // The header row is written by hand before the first record.
        let writer = WriterBuilder::new().has_headers(false).from_writer(staged);

        Ok(Self {
            destination,
            writer,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, record: &OutputRecord) -> Result<()> {
        if self.rows_written == 0 {
            self.writer.write_record(OUTPUT_COLUMNS)?;
        }
        self.writer.serialize(record)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Returns the path of the persisted file, or `None` when nothing was written
    /// and the staged file has been discarded.
    pub fn finish(self) -> Result<Option<PathBuf>> {
        if self.rows_written == 0 {
            return Ok(None);
        }

        let staged = self
            .writer
            .into_inner()
            .map_err(|e| NewsCrawlError::Io(io::Error::new(e.error().kind(), e.error().to_string())))?;
        staged.persist(&self.destination)?;

        Ok(Some(self.destination))
    }
}
