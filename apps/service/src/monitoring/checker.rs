use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, redirect};
use sentinel_store::{DownReason, Status};
use tokio::time::Instant;

/// Redirect hops followed before giving up
pub const MAX_REDIRECTS: usize = 30;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Probe trait for the different ways a target can be checked
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `target` once and classify the outcome. Never fails.
    async fn probe(&self, target: &str) -> Status;
}

/// Header set of a desktop browser, so sites that filter obvious bots do not
/// report false negatives. `Accept-Encoding` is added by the client itself.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

/// HTTP/HTTPS prober
///
/// Issues a single GET per probe, follows redirects and reads the whole body
/// before taking the latency.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration, headers: HeaderMap) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    async fn fetch(&self, target: &str) -> Status {
        let start = Instant::now();

        let outcome = async {
            let response = self.client.get(target).send().await?;
            let code = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(code)
        }
        .await;

        match outcome {
            Ok(code) => classify_response(code, start.elapsed()),
            Err(err) => Status::down(classify_error(&err)),
        }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &str) -> Status {
        self.fetch(target).await
    }
}

/// Map a transport failure onto the `DOWN` reasons, first match wins
pub fn classify_error(err: &reqwest::Error) -> DownReason {
    if err.is_timeout() {
        DownReason::Timeout
    } else if err.is_connect() {
        DownReason::ConnectionError
    } else if err.is_redirect() {
        DownReason::TooManyRedirects
    } else {
        DownReason::Error
    }
}

/// Only an exact 200 counts as up
pub fn classify_response(code: StatusCode, elapsed: Duration) -> Status {
    if code == StatusCode::OK {
        Status::up(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    } else {
        Status::down(DownReason::HttpStatus(code.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(timeout: Duration) -> HttpProber {
        HttpProber::new(timeout, browser_headers()).unwrap()
    }

    #[test]
    fn test_classify_response() {
        assert_eq!(classify_response(StatusCode::OK, Duration::from_millis(42)), Status::up(42));
        assert_eq!(
            classify_response(StatusCode::NO_CONTENT, Duration::ZERO),
            Status::down(DownReason::HttpStatus(204))
        );
        assert_eq!(
            classify_response(StatusCode::SERVICE_UNAVAILABLE, Duration::ZERO),
            Status::down(DownReason::HttpStatus(503))
        );
        assert_eq!(classify_response(StatusCode::OK, Duration::MAX), Status::up(u64::MAX));
    }

    #[tokio::test]
    async fn test_ok_response_is_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let status = prober(Duration::from_secs(5)).probe(&format!("{}/healthy", server.uri())).await;
        assert!(status.is_up(), "{status}");
        assert!(status.to_string().starts_with("UP ("));
        assert!(status.to_string().ends_with("ms)"));
    }

    #[tokio::test]
    async fn test_non_200_is_down_with_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let status = prober(Duration::from_secs(5)).probe(&format!("{}/missing", server.uri())).await;
        assert_eq!(status.to_string(), "DOWN (404)");
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let status = prober(Duration::from_millis(300)).probe(&format!("{}/slow", server.uri())).await;
        assert_eq!(status.to_string(), "DOWN (Timeout)");
    }

    #[tokio::test]
    async fn test_redirect_loop_is_too_many_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&server)
            .await;

        let status = prober(Duration::from_secs(5)).probe(&format!("{}/loop", server.uri())).await;
        assert_eq!(status.to_string(), "DOWN (Too Many Redirects)");
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let status = prober(Duration::from_secs(5)).probe(&format!("{}/old", server.uri())).await;
        assert!(status.is_up(), "{status}");
    }

    #[tokio::test]
    async fn test_browser_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("user-agent"))
            .and(header_exists("accept-language"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let status = prober(Duration::from_secs(5)).probe(&server.uri()).await;
        assert!(status.is_up(), "{status}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Bind then drop to get a local port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        let status = prober(Duration::from_secs(5)).probe(&format!("http://127.0.0.1:{port}/")).await;
        assert_eq!(status.to_string(), "DOWN (Connection Error)");
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_down() {
        let status = prober(Duration::from_secs(5)).probe("https://nonexistent.invalid").await;
        assert!(
            matches!(status, Status::Down(DownReason::ConnectionError | DownReason::Timeout | DownReason::Error)),
            "{status}"
        );
    }

    #[tokio::test]
    async fn test_malformed_url_is_error() {
        let status = prober(Duration::from_secs(5)).probe("not a url").await;
        assert_eq!(status.to_string(), "DOWN (Error)");
    }
}
