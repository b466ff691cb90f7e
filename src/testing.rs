use crate::feed::schema::{DOCUMENT_IDENTIFIER, GKG_HEADERS, TRANSLATION_INFO};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const FIXTURE_DATE: &str = "20210305070900";

/// One tab-separated GKG line with the given document URL and translation info.
pub fn gkg_line(url: &str, translation_info: &str) -> String {
    GKG_HEADERS
        .iter()
        .map(|&column| match column {
            "GKGRECORDID" => format!("{}-T1", FIXTURE_DATE),
            "DATE" => FIXTURE_DATE.to_string(),
            DOCUMENT_IDENTIFIER => url.to_string(),
            TRANSLATION_INFO => translation_info.to_string(),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\t")
}

pub fn write_batch(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let mut content = lines.join("\n");
    content.push('\n');
    write_batch_bytes(dir, name, content.as_bytes())
}

pub fn write_batch_bytes(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    zip.start_file("batch.translation.gkg.csv", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(content).unwrap();
    zip.finish().unwrap();
    path
}
