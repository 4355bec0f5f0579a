// ABOUTME: Fetcher boundary: retrieves raw release-notes markup for a URL.
// ABOUTME: Blocking HTTP fetch with a fixed timeout and User-Agent, plus a file-backed fetcher for saved pages.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::FetchError;

/// Maximum allowed body size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// User-Agent sent with every page request.
pub const DEFAULT_USER_AGENT: &str = "ai-release-notes-scraper/1.0";

/// Retrieves the markup behind a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

/// Options for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fetches pages over HTTP(S) with a blocking client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    pub fn new(opts: FetchOptions) -> Result<Self, FetchError> {
        let client = HttpClient::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::transport(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = resp.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size: len as usize,
                });
            }
        }

        let declared = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(declared_encoding);

        let body = resp.bytes().map_err(|e| FetchError::transport(url, e))?;
        if body.len() > MAX_CONTENT_LENGTH {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: body.len(),
            });
        }

        debug!(url, bytes = body.len(), "fetched page");
        Ok(decode_page(&body, declared))
    }
}

/// Serves a saved page from disk regardless of the requested URL.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, path = %self.path.display(), "reading saved page");
        let bytes = fs::read(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(decode_page(&bytes, None))
    }
}

/// Encoding named by the `charset` parameter of a Content-Type value.
fn declared_encoding(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        Encoding::for_label(label.as_bytes())
    })
}

/// Decodes page bytes. A byte-order mark wins, then the declared charset,
/// then a guess from the bytes themselves.
fn decode_page(bytes: &[u8], declared: Option<&'static Encoding>) -> String {
    let encoding = match Encoding::for_bom(bytes) {
        Some((bom, _)) => bom,
        None => declared.unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }),
    };
    debug!(encoding = encoding.name(), "decoding page");
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
