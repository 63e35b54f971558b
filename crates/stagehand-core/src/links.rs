//! Reference link extraction and liveness checks.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

pub trait UrlChecker {
    /// Issue a HEAD request. `Ok` carries the HTTP status, `Err` a transport failure.
    fn head_request(&self, url: &str) -> Result<u16, String>;
}

// ---------------------------------------------------------------------------
// HttpUrlChecker
// ---------------------------------------------------------------------------

pub struct HttpUrlChecker {
    client: Result<reqwest::blocking::Client, String>,
}

impl HttpUrlChecker {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("client build failed: {e}"));
        Self { client }
    }
}

impl UrlChecker for HttpUrlChecker {
    fn head_request(&self, url: &str) -> Result<u16, String> {
        let client = self.client.as_ref().map_err(Clone::clone)?;
        tracing::debug!(url, "HEAD");
        client
            .head(url)
            .send()
            .map(|resp| resp.status().as_u16())
            .map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

static INLINE_RE: OnceLock<Regex> = OnceLock::new();
static AUTOLINK_RE: OnceLock<Regex> = OnceLock::new();
static DEFINITION_RE: OnceLock<Regex> = OnceLock::new();

fn inline_re() -> &'static Regex {
    INLINE_RE.get_or_init(|| Regex::new(r#"\[[^\]]*\]\((https?://[^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap())
}

fn autolink_re() -> &'static Regex {
    AUTOLINK_RE.get_or_init(|| Regex::new(r"<(https?://[^>\s]+)>").unwrap())
}

fn definition_re() -> &'static Regex {
    DEFINITION_RE.get_or_init(|| Regex::new(r"(?m)^\s{0,3}\[[^\]]+\]:\s*<?(https?://[^>\s]+)>?").unwrap())
}

/// Every http(s) link in a markdown document, de-duplicated, in document order.
pub fn extract_links(markdown: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();
    for re in [inline_re(), autolink_re(), definition_re()] {
        for caps in re.captures_iter(markdown) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str()));
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut urls: Vec<String> = Vec::new();
    for (_, url) in found {
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Check every url and return one failure description per dead link.
/// A `404` or a transport error is dead; any other status is alive.
pub fn dead_links(checker: &dyn UrlChecker, urls: &[String]) -> Vec<(String, String)> {
    let mut dead = Vec::new();
    for url in urls {
        match checker.head_request(url) {
            Ok(404) => dead.push((url.clone(), "returned 404".to_string())),
            Ok(_) => {}
            Err(e) => dead.push((url.clone(), format!("request failed: {e}"))),
        }
    }
    if !dead.is_empty() {
        tracing::warn!(count = dead.len(), "dead reference links");
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_inline_autolink_and_definitions() {
        let md = "\
# References

- [RFC](https://www.rfc-editor.org/rfc/rfc9110 \"HTTP\")
- see <https://docs.rs/regex>
- [local](./notes.md)
- [again](https://www.rfc-editor.org/rfc/rfc9110)

[def]: https://example.org/spec
";
        assert_eq!(
            extract_links(md),
            vec![
                "https://www.rfc-editor.org/rfc/rfc9110",
                "https://docs.rs/regex",
                "https://example.org/spec",
            ]
        );
    }

    #[test]
    fn no_links() {
        assert!(extract_links("plain text, no urls").is_empty());
    }

    struct Canned;

    impl UrlChecker for Canned {
        fn head_request(&self, url: &str) -> Result<u16, String> {
            match url {
                "https://gone.example" => Ok(404),
                "https://down.example" => Err("connection refused".to_string()),
                "https://moved.example" => Ok(301),
                _ => Ok(200),
            }
        }
    }

    #[test]
    fn dead_links_reports_all_failures_in_order() {
        let urls: Vec<String> = [
            "https://ok.example",
            "https://gone.example",
            "https://moved.example",
            "https://down.example",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let dead = dead_links(&Canned, &urls);
        assert_eq!(dead.len(), 2);
        assert_eq!(dead[0].0, "https://gone.example");
        assert!(dead[1].1.contains("connection refused"));
    }

    #[test]
    fn http_checker_reads_status() {
        let mut server = mockito::Server::new();
        let ok = server.mock("HEAD", "/alive").with_status(200).create();
        let gone = server.mock("HEAD", "/gone").with_status(404).create();

        let checker = HttpUrlChecker::new(Duration::from_secs(5));
        assert_eq!(checker.head_request(&format!("{}/alive", server.url())), Ok(200));
        assert_eq!(checker.head_request(&format!("{}/gone", server.url())), Ok(404));
        ok.assert();
        gone.assert();
    }

    #[test]
    fn http_checker_transport_error() {
        let checker = HttpUrlChecker::new(Duration::from_secs(2));
        assert!(checker.head_request("http://127.0.0.1:1/unreachable").is_err());
    }
}
