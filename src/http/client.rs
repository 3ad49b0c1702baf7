use super::debug::{
    HttpDebugConfig, redact_header_value, redact_text_body, redact_url, truncate_for_log,
};
use crate::trace::SessionTrace;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// The remote services the mentor talks to. Labels every debug and trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Gemini,
    YouTube,
}

impl Upstream {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::YouTube => "youtube",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    fn marker(self) -> char {
        match self {
            Self::Outgoing => '>',
            Self::Incoming => '<',
        }
    }
}

/// Shared `reqwest` client that mirrors each exchange to `--verbose` stderr and the session trace.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    sink: LogSink,
    trace: Option<SessionTrace>,
}

#[derive(Clone)]
enum LogSink {
    Stderr,
    #[cfg(test)]
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            sink: LogSink::Stderr,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Gemini `generateContent` style call: JSON body, credentials in the query.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        upstream: Upstream,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpResponseData, reqwest::Error> {
        let body_json = serde_json::to_string(payload)
            .unwrap_or_else(|err| format!("{{\"_serialization_error\":\"{err}\"}}"));
        let request = self.inner.post(url).query(query).json(payload).build()?;
        self.execute(upstream, request, &body_json).await
    }

    /// YouTube Data API style call: everything travels in the query string.
    pub async fn get(
        &self,
        upstream: Upstream,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpResponseData, reqwest::Error> {
        let request = self.inner.get(url).query(query).build()?;
        self.execute(upstream, request, "").await
    }

    async fn execute(
        &self,
        upstream: Upstream,
        request: Request,
        body_text: &str,
    ) -> Result<HttpResponseData, reqwest::Error> {
        // Trace lines always get the redacted URL, whatever `--verbose` says.
        let url = redact_url(request.url(), true);
        if self.debug.enabled {
            let opening = format!(
                "{} {}",
                request.method(),
                redact_url(request.url(), self.debug.redact_secrets)
            );
            self.emit(exchange_log_lines(
                self.debug,
                upstream,
                Direction::Outgoing,
                &opening,
                request.headers(),
                body_text,
            ));
        }
        if let Some(trace) = &self.trace {
            trace.log_http_request(
                upstream.label(),
                request.method().as_str(),
                &url,
                request.headers(),
                &redact_text_body(body_text, true),
            );
        }

        let response = match self.inner.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                if let Some(trace) = &self.trace {
                    trace.log_http_error(upstream.label(), &err.to_string());
                }
                return Err(err);
            }
        };
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if self.debug.enabled {
            self.emit(exchange_log_lines(
                self.debug,
                upstream,
                Direction::Incoming,
                &format!("HTTP {status}"),
                &headers,
                &body,
            ));
        }
        if let Some(trace) = &self.trace {
            trace.log_http_response(status, &headers, &body);
        }

        Ok(HttpResponseData { status, body })
    }

    fn emit(&self, lines: Vec<String>) {
        match &self.sink {
            LogSink::Stderr => {
                let mut stderr = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{line}");
                }
            }
            #[cfg(test)]
            LogSink::Buffer(buffer) => {
                if let Ok(mut b) = buffer.lock() {
                    b.extend(lines);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn with_buffer_sink(
        inner: Client,
        debug: HttpDebugConfig,
    ) -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            inner,
            debug,
            sink: LogSink::Buffer(Arc::clone(&buffer)),
            trace: None,
        };
        (client, buffer)
    }
}

/// `--verbose` dump of one half of an exchange: opening line, headers, blank separator, body.
fn exchange_log_lines(
    debug: HttpDebugConfig,
    upstream: Upstream,
    direction: Direction,
    opening: &str,
    headers: &HeaderMap,
    body: &str,
) -> Vec<String> {
    let prefix = format!("[http-debug {}] {}", upstream.label(), direction.marker());
    let body = redact_text_body(body, debug.redact_secrets);
    let body = truncate_for_log(&body, debug.max_body_chars);

    let mut lines = vec![format!("{prefix} {opening}")];
    lines.extend(headers.iter().map(|(name, value)| {
        format!(
            "{prefix} {}: {}",
            name.as_str(),
            redact_header_value(name.as_str(), value, debug.redact_secrets)
        )
    }));
    lines.push(prefix.clone());
    if body.is_empty() {
        lines.push(format!("{prefix} <empty body>"));
    } else {
        lines.extend(body.lines().map(|line| format!("{prefix} {line}")));
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Leading part of an error body, short enough for a chat error line.
    pub fn error_excerpt(&self, max_chars: usize) -> String {
        self.body.trim().chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, HttpClient, HttpResponseData, Upstream, exchange_log_lines};
    use crate::http::debug::HttpDebugConfig;
    use crate::trace::SessionTrace;
    use reqwest::Client;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use serde::Deserialize;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn verbose() -> HttpDebugConfig {
        HttpDebugConfig::from_verbose(true)
    }

    #[tokio::test]
    async fn gemini_call_is_dumped_with_key_and_secrets_masked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "gemini-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Try SQL next."}]}}]
            })))
            .mount(&server)
            .await;

        let (client, logs) = HttpClient::with_buffer_sink(Client::new(), verbose());
        let response = client
            .post_json(
                Upstream::Gemini,
                &format!("{}{GENERATE_PATH}", server.uri()),
                &[("key", "gemini-secret")],
                &json!({"contents": [{"role": "user", "parts": [{"text": "What next?"}]}]}),
            )
            .await
            .expect("request should succeed");

        assert!(response.is_success());
        assert!(response.body.contains("Try SQL next."));

        let logged = logs.lock().expect("logs lock").join("\n");
        assert!(logged.contains("[http-debug gemini] > POST"));
        assert!(logged.contains("[http-debug gemini] < HTTP 200"));
        assert!(logged.contains("key=***REDACTED***"));
        assert!(logged.contains("What next?"));
        assert!(!logged.contains("gemini-secret"));
    }

    #[tokio::test]
    async fn youtube_lookup_is_silent_unless_verbose() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(query_param("q", "Data Scientist roadmap skills"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let (client, logs) =
            HttpClient::with_buffer_sink(Client::new(), HttpDebugConfig::disabled());
        let response = client
            .get(
                Upstream::YouTube,
                &format!("{}/youtube/v3/search", server.uri()),
                &[("q", "Data Scientist roadmap skills"), ("key", "yt-secret")],
            )
            .await
            .expect("request should succeed");

        assert_eq!(
            response,
            HttpResponseData {
                status: 403,
                body: "quotaExceeded".to_string(),
            }
        );
        assert!(!response.is_success());
        assert!(logs.lock().expect("logs lock").is_empty());
    }

    #[tokio::test]
    async fn trace_names_the_upstream_and_hides_the_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_temp_dir("test-session", dir.path()).expect("trace");
        let trace_file = trace.file_path().to_path_buf();
        let client =
            HttpClient::new(Client::new(), HttpDebugConfig::disabled()).with_trace(trace.clone());

        client
            .post_json(
                Upstream::Gemini,
                &format!("{}{GENERATE_PATH}", server.uri()),
                &[("key", "gemini-secret")],
                &json!({"contents": [{"role": "user", "parts": [{"text": "hello mentor"}]}]}),
            )
            .await
            .expect("request should succeed");

        let trace_text = fs::read_to_string(trace_file).expect("read trace file");
        assert!(trace_text.contains("gemini POST"));
        assert!(trace_text.contains("hello mentor"));
        assert!(trace_text.contains("HTTP 200"));
        assert!(!trace_text.contains("gemini-secret"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_traced_as_error() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_temp_dir("test-session", dir.path()).expect("trace");
        let trace_file = trace.file_path().to_path_buf();
        let client =
            HttpClient::new(Client::new(), HttpDebugConfig::disabled()).with_trace(trace.clone());

        let result = client
            .get(Upstream::YouTube, "http://127.0.0.1:9/youtube/v3/videos", &[])
            .await;

        assert!(result.is_err());
        let trace_text = fs::read_to_string(trace_file).expect("read trace file");
        assert!(trace_text.contains("youtube: "), "trace:\n{trace_text}");
    }

    #[test]
    fn quota_error_dump_matches_snapshot() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let lines = exchange_log_lines(
            verbose(),
            Upstream::YouTube,
            Direction::Incoming,
            "HTTP 403",
            &headers,
            r#"{"error":{"code":403,"reason":"quotaExceeded"},"key":"yt-secret"}"#,
        );
        insta::assert_snapshot!(lines.join("\n"), @r#"
        [http-debug youtube] < HTTP 403
        [http-debug youtube] < content-type: application/json
        [http-debug youtube] <
        [http-debug youtube] < {"error":{"code":403,"reason":"quotaExceeded"},"key":"***REDACTED***"}
        "#);
    }

    #[test]
    fn request_dump_without_body_says_so() {
        let lines = exchange_log_lines(
            verbose(),
            Upstream::YouTube,
            Direction::Outgoing,
            "GET https://www.googleapis.com/youtube/v3/videos?part=contentDetails",
            &HeaderMap::new(),
            "",
        );
        assert_eq!(
            lines,
            vec![
                "[http-debug youtube] > GET https://www.googleapis.com/youtube/v3/videos?part=contentDetails",
                "[http-debug youtube] >",
                "[http-debug youtube] > <empty body>",
            ]
        );
    }

    #[test]
    fn response_helpers_parse_json_and_cut_error_bodies() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Reply {
            ok: bool,
        }

        let ok = HttpResponseData {
            status: 200,
            body: r#"{"ok":true}"#.to_string(),
        };
        assert_eq!(ok.json::<Reply>().expect("json"), Reply { ok: true });

        let failed = HttpResponseData {
            status: 429,
            body: "  RESOURCE_EXHAUSTED: quota for gemini-test reached\n".to_string(),
        };
        assert_eq!(failed.error_excerpt(18), "RESOURCE_EXHAUSTED");
        assert!(failed.json::<Reply>().is_err());
    }
}
