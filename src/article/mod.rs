pub mod extractor;
pub mod retriever;

pub use extractor::{Document, DocumentExtractor, ExtractError, HtmlDocumentExtractor, HtmlParser};
pub use retriever::{DocumentRetriever, OutputRecord, OUTPUT_COLUMNS};
