use anyhow::{Context, Result};

use carol_core::importer::PageFetcher;

pub struct PageClient {
    client: reqwest::Client,
}

impl PageClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "carol-cli/{} (meal journal)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    #[cfg(test)]
    fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for PageClient {
    /// Any HTTP status is accepted; error pages are parsed like any other.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "recipe page returned an error status");
        }

        resp.text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::response::Html;
    use axum::routing::get;
    use carol_core::importer::{ImportOutcome, import_from};

    fn client() -> PageClient {
        PageClient::from_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    async fn serve(page: &'static str) -> String {
        let app = Router::new().route("/recipe", get(move || async move { Html(page) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/recipe")
    }

    #[tokio::test]
    async fn test_fetch_page_body() {
        let url = serve("<title>凉拌黄瓜</title>").await;
        let body = client().fetch_page(&url).await.unwrap();
        assert!(body.contains("凉拌黄瓜"));
    }

    #[tokio::test]
    async fn test_import_from_served_page() {
        let url = serve(
            r#"<html><head>
                <meta property="og:title" content="红烧肉">
                <meta property="og:image" content="https://img.example.com/pork.jpg">
            </head></html>"#,
        )
        .await;
        let report = import_from(&client(), &url).await;
        assert_eq!(report.outcome, ImportOutcome::Imported);
        assert_eq!(report.recipe.title, "红烧肉");
        assert_eq!(report.recipe.cover, "https://img.example.com/pork.jpg");
        assert_eq!(report.recipe.source_url, url);
    }

    #[tokio::test]
    async fn test_import_from_refused_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/recipe");

        let report = import_from(&client(), &url).await;
        assert!(matches!(report.outcome, ImportOutcome::Failed { .. }));
        assert_eq!(report.recipe.title, url);
        assert_eq!(report.recipe.cover, "");
    }

    #[tokio::test]
    async fn test_not_found_page_is_still_parsed() {
        let url = serve("<title>ok</title>").await.replace("/recipe", "/missing");
        let report = import_from(&client(), &url).await;
        assert_eq!(report.outcome, ImportOutcome::Degraded);
        assert_eq!(report.recipe.title, url);
    }
}
