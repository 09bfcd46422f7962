//! HTTP fetching shared by every job source.
//!
//! A [`Fetcher`] is built once per refresh from an immutable [`FetchConfig`]
//! and handed to each source. It owns the connection pool, the redirect and
//! timeout policy, and the browser header set some boards insist on.

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use remotejobs_shared::{FetchConfig, RemoteJobsError, Result};

/// User-Agent for plain requests.
const USER_AGENT: &str = concat!("remotejobs/", env!("CARGO_PKG_VERSION"));

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
     image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

const SEC_CH_UA: &str = r#""Chromium";v="118", "Google Chrome";v="118", "Not=A?Brand";v="99""#;

/// How a request presents itself to the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStyle {
    /// Full desktop-browser header set, for boards that reject bots.
    Browser,
    /// Client defaults only.
    Plain,
}

/// Shared HTTP client plus request policy.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    browser_headers: HeaderMap,
}

impl Fetcher {
    /// Build a fetcher from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteJobsError::config(format!("failed to build HTTP client: {e}")))?;

        let browser_headers = browser_headers(&config)?;

        Ok(Self {
            client,
            config,
            browser_headers,
        })
    }

    /// The configuration this fetcher was built from.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and return the body as text.
    ///
    /// Network failures, timeouts, and non-success statuses all become
    /// [`RemoteJobsError::Fetch`] attributed to `source_name`.
    pub async fn get_html(&self, source_name: &str, url: &Url, style: RequestStyle) -> Result<String> {
        debug!(source = source_name, %url, ?style, "fetching page");

        let mut request = self.client.get(url.as_str());
        if style == RequestStyle::Browser {
            request = request.headers(self.browser_headers.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteJobsError::fetch(source_name, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteJobsError::fetch(
                source_name,
                format!("{url}: HTTP {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| RemoteJobsError::fetch(source_name, format!("{url}: body read failed: {e}")))
    }
}

/// The header set a desktop Chrome sends on a top-level navigation.
fn browser_headers(config: &FetchConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .map_err(|e| RemoteJobsError::config(format!("invalid accept_language: {e}")))?,
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(SEC_CH_UA),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| RemoteJobsError::config(format!("invalid user_agent: {e}")))?,
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(FetchConfig::default()).expect("build fetcher")
    }

    #[test]
    fn browser_header_set() {
        let headers = browser_headers(&FetchConfig::default()).unwrap();
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert_eq!(headers["sec-fetch-site"], "none");
        assert!(headers[header::USER_AGENT].to_str().unwrap().contains("Chrome/118"));
        assert!(headers[header::ACCEPT_LANGUAGE].to_str().unwrap().starts_with("fr-FR"));
    }

    #[test]
    fn invalid_header_value_is_config_error() {
        let config = FetchConfig {
            user_agent: "bad\nagent".into(),
            ..FetchConfig::default()
        };
        let err = Fetcher::new(config).unwrap_err();
        assert!(err.to_string().contains("user_agent"));
    }

    #[tokio::test]
    async fn browser_style_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(header_eq("sec-fetch-dest", "document"))
            .and(header_eq("upgrade-insecure-requests", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/jobs", server.uri())).unwrap();
        let body = fetcher()
            .get_html("test", &url, RequestStyle::Browser)
            .await
            .expect("fetch");
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn plain_style_uses_client_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(header_eq("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/jobs", server.uri())).unwrap();
        let body = fetcher()
            .get_html("test", &url, RequestStyle::Plain)
            .await
            .expect("fetch");
        assert_eq!(body, "plain");
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/jobs", server.uri())).unwrap();
        let err = fetcher()
            .get_html("remoteok", &url, RequestStyle::Browser)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteJobsError::Fetch { ref source_name, .. } if source_name == "remoteok"));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let body = fetcher()
            .get_html("test", &url, RequestStyle::Plain)
            .await
            .expect("fetch");
        assert_eq!(body, "moved");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..FetchConfig::default()
        };
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let result = Fetcher::new(config)
            .unwrap()
            .get_html("test", &url, RequestStyle::Plain)
            .await;
        assert!(result.is_err());
    }
}
