//! [`RenderPort`] backed by a Kroki server.
//!
//! Diagrams are sent as `text/plain` to `POST {url}/plantuml/{format}`.
//! Initialization calls `GET {url}/health` so an unreachable server disables
//! image output once instead of failing every tag.

use std::io::Cursor;
use std::time::Duration;

use ureq::Agent;

use crate::consts::{DEFAULT_TIMEOUT, KROKI_ENDPOINT};
use crate::render::{RenderError, RenderPort, RenderStream};

/// Kroki HTTP renderer.
pub struct KrokiRenderer {
    server_url: String,
    agent: Agent,
}

impl KrokiRenderer {
    /// Create a renderer for the given Kroki server URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let renderer = KrokiRenderer::new("https://kroki.io");
    /// ```
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_owned(),
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Set HTTP timeout for Kroki requests.
    ///
    /// Default is 30 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Server URL without trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn render_url(&self, format: &str) -> String {
        format!("{}/{KROKI_ENDPOINT}/{format}", self.server_url)
    }
}

/// Create HTTP agent with the specified timeout.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

impl RenderPort for KrokiRenderer {
    fn initialize(&self) -> Result<(), RenderError> {
        let url = format!("{}/health", self.server_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| RenderError::Unavailable(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(RenderError::Unavailable(format!(
                "{url} returned HTTP {status}"
            )));
        }
        tracing::debug!(url = %self.server_url, "Kroki server available");
        Ok(())
    }

    fn render(&self, source: &str, format: &str) -> Result<RenderStream, RenderError> {
        let url = self.render_url(format);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| RenderError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Http(format!("HTTP {status}: {error_body}")));
        }

        let data = body
            .read_to_vec()
            .map_err(|e| RenderError::Io(std::io::Error::other(e)))?;
        Ok(Box::new(Cursor::new(data)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;
    use pretty_assertions::assert_eq;

    /// Request line and body received by [`serve_once`].
    struct Received {
        request_line: String,
        content_type: Option<String>,
        body: String,
    }

    /// Answer a single HTTP request with `status` and `body`.
    ///
    /// Returns the server URL and a handle yielding what the client sent.
    fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            let mut content_type = None;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    match name.to_ascii_lowercase().as_str() {
                        "content-length" => content_length = value.trim().parse().unwrap(),
                        "content-type" => content_type = Some(value.trim().to_owned()),
                        _ => {}
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();

            Received {
                request_line: request_line.trim_end().to_owned(),
                content_type,
                body: String::from_utf8(request_body).unwrap(),
            }
        });

        (url, handle)
    }

    #[test]
    fn test_render_url() {
        let renderer = KrokiRenderer::new("https://kroki.io/");
        assert_eq!(renderer.server_url(), "https://kroki.io");
        assert_eq!(renderer.render_url("svg"), "https://kroki.io/plantuml/svg");
    }

    #[test]
    fn test_initialize_unreachable_server() {
        // Port 9 (discard) on localhost is not an HTTP server.
        let renderer =
            KrokiRenderer::new("http://127.0.0.1:9").timeout(Duration::from_millis(500));
        let err = renderer.initialize().unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
        assert!(err.to_string().contains("127.0.0.1:9/health"));
    }

    #[test]
    fn test_render_posts_source_and_returns_image() {
        let (url, server) = serve_once("200 OK", b"<svg/>");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));

        let mut stream = renderer
            .render("@startuml\nA -> B\n@enduml", "svg")
            .unwrap();
        let mut image = String::new();
        stream.read_to_string(&mut image).unwrap();

        assert_eq!(image, "<svg/>");
        let received = server.join().unwrap();
        assert_eq!(received.request_line, "POST /plantuml/svg HTTP/1.1");
        assert_eq!(received.content_type.as_deref(), Some("text/plain"));
        assert_eq!(received.body, "@startuml\nA -> B\n@enduml");
    }

    #[test]
    fn test_render_error_status_is_http_error() {
        let (url, server) = serve_once("400 Bad Request", b"Syntax Error? (line 2)");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));

        let err = renderer.render("@startuml\n???\n@enduml", "png").err().unwrap();

        assert!(matches!(err, RenderError::Http(_)));
        assert_eq!(
            err.to_string(),
            "HTTP error: HTTP 400: Syntax Error? (line 2)"
        );
        server.join().unwrap();
    }

    #[test]
    fn test_initialize_unhealthy_server() {
        let (url, server) = serve_once("503 Service Unavailable", b"");
        let renderer = KrokiRenderer::new(url).timeout(Duration::from_secs(5));

        let err = renderer.initialize().unwrap_err();

        assert!(matches!(err, RenderError::Unavailable(_)));
        assert!(err.to_string().ends_with("/health returned HTTP 503"));
        assert_eq!(server.join().unwrap().request_line, "GET /health HTTP/1.1");
    }
}
