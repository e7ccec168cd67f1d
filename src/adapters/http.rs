use crate::domain::ports::{NetworkProbe, ReferenceSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::{redirect, Client};
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;
const ANCHOR_HREF_PATTERN: &str = r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#;

/// Plain GET probe. Redirects are followed, so the status is that of the final response.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NetworkProbe for HttpProbe {
    async fn status(&self, url: &str) -> Result<u16> {
        tracing::debug!("Probing {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        tracing::debug!("Probe status for {}: {}", url, status);
        Ok(status)
    }
}

/// Reads the repository link out of the storefront page markup without a browser.
pub struct HtmlReferenceSource {
    client: Client,
    page_url: String,
    host: String,
}

impl HtmlReferenceSource {
    pub fn new(page_url: &str, host: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            page_url: page_url.to_string(),
            host: host.to_string(),
        })
    }
}

/// First anchor `href` in `html` that mentions `host`.
pub fn find_link(html: &str, host: &str) -> Result<Option<String>> {
    let anchors = Regex::new(ANCHOR_HREF_PATTERN)?;
    let link = anchors
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|href| href.as_str().trim())
        .find(|href| href.contains(host))
        .map(str::to_string);
    Ok(link)
}

#[async_trait]
impl ReferenceSource for HtmlReferenceSource {
    async fn fetch_reference(&self) -> Result<Option<String>> {
        tracing::debug!("Fetching storefront page {}", self.page_url);
        let html = self
            .client
            .get(&self.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let link = find_link(&html, &self.host)?;
        if link.is_none() {
            tracing::warn!("No {} link on {}", self.host, self.page_url);
        }
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PAGE: &str = r#"<html><body>
        <a href="/about">About</a>
        <a class="github" target="_blank" href="https://github.com/acme/shop">Source</a>
        <a href='https://github.com/acme/other'>Other</a>
    </body></html>"#;

    #[test]
    fn test_find_link_returns_first_matching_anchor() {
        let link = find_link(PAGE, "github.com").unwrap();
        assert_eq!(link.as_deref(), Some("https://github.com/acme/shop"));
        assert_eq!(find_link(PAGE, "gitlab.com").unwrap(), None);
    }

    #[tokio::test]
    async fn test_probe_reports_final_status_after_redirects() {
        let server = MockServer::start();
        let ok = server.mock(|when, then| {
            when.method(GET).path("/repo");
            then.status(200);
        });
        let moved = server.mock(|when, then| {
            when.method(GET).path("/moved");
            then.status(301).header("location", "/repo");
        });
        let gone = server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();
        assert_eq!(probe.status(&server.url("/repo")).await.unwrap(), 200);
        assert_eq!(probe.status(&server.url("/moved")).await.unwrap(), 200);
        assert_eq!(probe.status(&server.url("/gone")).await.unwrap(), 404);
        ok.assert_hits(2);
        moved.assert_hits(1);
        gone.assert_hits(1);
    }

    #[tokio::test]
    async fn test_html_source_scrapes_the_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("content-type", "text/html")
                .body(PAGE);
        });

        let source =
            HtmlReferenceSource::new(&server.url("/"), "github.com", Duration::from_secs(5))
                .unwrap();
        let link = source.fetch_reference().await.unwrap();
        assert_eq!(link.as_deref(), Some("https://github.com/acme/shop"));
    }

    #[tokio::test]
    async fn test_html_source_fails_on_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(503);
        });

        let source =
            HtmlReferenceSource::new(&server.url("/"), "github.com", Duration::from_secs(5))
                .unwrap();
        assert!(source.fetch_reference().await.is_err());
    }
}
