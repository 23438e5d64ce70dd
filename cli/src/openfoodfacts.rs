use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use bite_core::lookup::{LookupError, LookupGateway, LookupHit};
use bite_core::openfoodfacts::{ProductResponse, response_to_hit};

use crate::config::LookupConfig;

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "bite/{} (nutrition tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub async fn fetch_product(&self, barcode: &str) -> Result<ProductResponse, LookupError> {
        // Barcodes go into the URL path, so anything but digits is rejected up front
        if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
            return Err(LookupError::NotFound);
        }

        let url = format!("{}/api/v0/product/{barcode}.json", self.base_url);
        debug!(%url, "fetching product");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::NetworkFailure(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(LookupError::NotFound),
            s if !s.is_success() => {
                return Err(LookupError::NetworkFailure(format!("HTTP {s}")));
            }
            _ => {}
        }

        resp.json::<ProductResponse>()
            .await
            .map_err(|e| LookupError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl LookupGateway for OpenFoodFactsClient {
    async fn lookup(&self, barcode: &str) -> Result<LookupHit, LookupError> {
        let resp = self.fetch_product(barcode).await?;
        response_to_hit(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> OpenFoodFactsClient {
        OpenFoodFactsClient::new(&LookupConfig {
            base_url,
            timeout_secs: 5,
            connect_timeout_secs: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let url = serve_once(
            "200 OK",
            r#"{"status":1,"product":{"product_name":"Nutella","nutriments":{"energy-kcal_100g":539,"proteins_100g":6.3,"carbohydrates_100g":57.5,"fat_100g":30.9}}}"#,
        )
        .await;
        let hit = client(url).lookup("3017620422003").await.unwrap();
        assert_eq!(hit.name.as_deref(), Some("Nutella"));
        assert_eq!(hit.profile.calories_per_100g(), 539.0);
    }

    #[tokio::test]
    async fn test_lookup_status_zero() {
        let url = serve_once("200 OK", r#"{"status":0,"status_verbose":"product not found"}"#).await;
        let err = client(url).lookup("0000000000000").await.unwrap_err();
        assert_eq!(err, LookupError::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_http_404() {
        let url = serve_once("404 Not Found", r#"{"status":0}"#).await;
        let err = client(url).lookup("0000000000000").await.unwrap_err();
        assert_eq!(err, LookupError::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_server_error() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let err = client(url).lookup("3017620422003").await.unwrap_err();
        assert!(matches!(err, LookupError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_lookup_malformed_body() {
        let url = serve_once("200 OK", "<html>oops</html>").await;
        let err = client(url).lookup("3017620422003").await.unwrap_err();
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_lookup_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(format!("http://{addr}"))
            .lookup("3017620422003")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_lookup_rejects_non_numeric_barcode() {
        let c = client("http://127.0.0.1:9".to_string());
        assert_eq!(c.lookup("").await.unwrap_err(), LookupError::NotFound);
        assert_eq!(
            c.lookup("../../etc").await.unwrap_err(),
            LookupError::NotFound
        );
    }

    // --- Integration tests (hit real OpenFoodFacts API) ---

    #[tokio::test]
    #[ignore = "hits OpenFoodFacts API"]
    async fn test_lookup_known_product() {
        let c = client("https://world.openfoodfacts.org".to_string());
        let hit = c.lookup("3017620422003").await.unwrap();
        assert!(hit.name.unwrap().to_lowercase().contains("nutella"));
        assert!(hit.profile.calories_per_100g() > 0.0);
    }

    #[tokio::test]
    #[ignore = "hits OpenFoodFacts API"]
    async fn test_lookup_unknown_product() {
        let c = client("https://world.openfoodfacts.org".to_string());
        assert_eq!(
            c.lookup("0000000000000").await.unwrap_err(),
            LookupError::NotFound
        );
    }
}
