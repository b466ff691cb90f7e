use crate::config::ArticleConfig;
use crate::error::{NewsCrawlError, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid article URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("unsupported content type: {0}")]
    ContentType(String),
    #[error("no article text found")]
    EmptyBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub text: String,
}

pub trait DocumentExtractor {
    fn extract(&self, url: &str) -> std::result::Result<Document, ExtractError>;
}

/// Pulls the title and paragraph text out of an article page.
pub struct HtmlParser {
    og_title: Selector,
    title: Selector,
    heading: Selector,
    article_paragraphs: Selector,
    paragraphs: Selector,
}

impl HtmlParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            og_title: selector(r#"meta[property="og:title"]"#)?,
            title: selector("title")?,
            heading: selector("h1")?,
            article_paragraphs: selector("article p")?,
            paragraphs: selector("p")?,
        })
    }

    pub fn parse(&self, html: &str) -> std::result::Result<Document, ExtractError> {
        let document = Html::parse_document(html);

        let text = {
            let scoped = self.collect_paragraphs(&document, &self.article_paragraphs);
            if scoped.is_empty() {
                self.collect_paragraphs(&document, &self.paragraphs)
            } else {
                scoped
            }
        };

        if text.is_empty() {
            return Err(ExtractError::EmptyBody);
        }

        Ok(Document {
            title: self.find_title(&document),
            text,
        })
    }

    fn find_title(&self, document: &Html) -> String {
        let from_meta = document
            .select(&self.og_title)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string);

        from_meta
            .or_else(|| first_text(document, &self.title))
            .or_else(|| first_text(document, &self.heading))
            .unwrap_or_default()
    }

    fn collect_paragraphs(&self, document: &Html, selector: &Selector) -> String {
        document
            .select(selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NewsCrawlError::Config {
        message: format!("Invalid selector {}: {:?}", css, e),
    })
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct HtmlDocumentExtractor {
    client: Client,
    parser: HtmlParser,
}

impl HtmlDocumentExtractor {
    pub fn new(config: &ArticleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| NewsCrawlError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            parser: HtmlParser::new()?,
        })
    }
}

impl DocumentExtractor for HtmlDocumentExtractor {
    fn extract(&self, url: &str) -> std::result::Result<Document, ExtractError> {
        let parsed = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(parsed).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("html") {
            return Err(ExtractError::ContentType(content_type));
        }

        let body = response.text()?;
        self.parser.parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"
        <html>
          <head>
            <title>Site | Fallback title</title>
            <meta property="og:title" content=" Storm reaches the coast ">
          </head>
          <body>
            <nav><p>Home</p></nav>
            <article>
              <h1>Storm reaches the coast</h1>
              <p>The storm made landfall
                 early on Tuesday.</p>
              <p></p>
              <p>Thousands were evacuated.</p>
            </article>
          </body>
        </html>"#;

    #[test]
    fn test_parse_article() {
        let parser = HtmlParser::new().unwrap();
        let document = parser.parse(ARTICLE).unwrap();

        assert_eq!(document.title, "Storm reaches the coast");
        assert_eq!(
            document.text,
            "The storm made landfall early on Tuesday.\n\nThousands were evacuated."
        );
    }

    #[test]
    fn test_title_fallbacks() {
        let parser = HtmlParser::new().unwrap();

        let html = "<html><head><title>Plain title</title></head><body><p>Body</p></body></html>";
        assert_eq!(parser.parse(html).unwrap().title, "Plain title");

        let html = "<html><body><h1>Heading</h1><p>Body</p></body></html>";
        assert_eq!(parser.parse(html).unwrap().title, "Heading");
    }

    #[test]
    fn test_paragraphs_outside_article() {
        let parser = HtmlParser::new().unwrap();
        let html = "<html><body><div><p>First.</p><p>Second.</p></div></body></html>";

        assert_eq!(parser.parse(html).unwrap().text, "First.\n\nSecond.");
    }

    #[test]
    fn test_page_without_text_fails() {
        let parser = HtmlParser::new().unwrap();
        let result = parser.parse("<html><head><title>Empty</title></head><body></body></html>");
        assert!(matches!(result, Err(ExtractError::EmptyBody)));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let extractor = HtmlDocumentExtractor::new(&ArticleConfig::default()).unwrap();

        assert!(matches!(
            extractor.extract("ftp://a.com/story"),
            Err(ExtractError::InvalidUrl(_))
        ));
        assert!(matches!(
            extractor.extract("not a url"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }
}
