//! Client for the GCP Cloud Billing catalog API

use anyhow::{Context, Result};
use estimator_lib::config::PricingConfig;
use estimator_lib::pricing::{GcpPriceResolver, ListSkusResponse, COMPUTE_ENGINE_SERVICE};
use estimator_lib::GcpPriceCatalog;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BILLING_URL: &str = "https://cloudbilling.googleapis.com";

/// Read-only client for `services/*/skus`
pub struct BillingClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl BillingClient {
    /// Create a new billing client
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid billing API URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Billing API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch one page of SKUs of a service
    pub async fn list_skus(&self, service: &str, page_token: Option<&str>) -> Result<ListSkusResponse> {
        let mut url = self
            .base_url
            .join(&format!("v1/services/{}/skus", service))
            .context("Invalid path")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.api_key);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        self.get(url).await
    }

    /// Page through Compute Engine SKUs until the CPU, memory and storage prices are known
    pub async fn fetch_catalog(&self, config: &PricingConfig) -> Result<GcpPriceCatalog> {
        info!(
            machine_family = %config.machine_family,
            region = %config.region,
            "Retrieving prices from the Cloud Billing catalog"
        );

        let mut resolver = GcpPriceResolver::new(config);
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .list_skus(COMPUTE_ENGINE_SERVICE, page_token.as_deref())
                .await
                .context("Failed to list Compute Engine SKUs")?;
            pages += 1;
            debug!(page = pages, skus = page.skus.len(), "Fetched SKU page");

            for sku in &page.skus {
                resolver.offer(sku);
            }
            if resolver.is_complete() {
                break;
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(pages, "Finished reading SKU pages");
        resolver.finish().context("Failed to resolve unit prices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator_lib::pricing::GIB;
    use estimator_lib::{MachineFamily, PriceCatalog};
    use mockito::Matcher;

    const SKUS_PATH: &str = "/v1/services/6F81-5844-456A/skus";

    fn sku(id: &str, description: &str, unit: &str, units: &str, nanos: i64) -> serde_json::Value {
        serde_json::json!({
            "skuId": id,
            "description": description,
            "serviceRegions": ["us-central1"],
            "pricingInfo": [{
                "pricingExpression": {
                    "usageUnit": unit,
                    "tieredRates": [{
                        "unitPrice": {"currencyCode": "USD", "units": units, "nanos": nanos}
                    }]
                }
            }]
        })
    }

    fn pricing() -> PricingConfig {
        PricingConfig {
            machine_family: MachineFamily::E2,
            region: "us-central1".to_string(),
            ..PricingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_catalog_follows_pages() {
        let mut server = mockito::Server::new_async().await;

        let first = serde_json::json!({
            "skus": [
                sku("cpu", "E2 Instance Core running in Americas", "h", "0", 21_811_590),
                sku("ram", "E2 Instance Ram running in Americas", "GiBy.h", "0", 2_923_530),
            ],
            "nextPageToken": "p2"
        });
        let second = serde_json::json!({
            "skus": [
                sku("pd", "Regional Storage PD Capacity in Iowa", "GiBy.mo", "0", 80_000_000),
            ],
            "nextPageToken": ""
        });

        let page_one = server
            .mock("GET", SKUS_PATH)
            .match_query(Matcher::Exact("key=secret".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(first.to_string())
            .create_async()
            .await;
        let page_two = server
            .mock("GET", SKUS_PATH)
            .match_query(Matcher::Exact("key=secret&pageToken=p2".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(second.to_string())
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "secret").unwrap();
        let catalog = client.fetch_catalog(&pricing()).await.unwrap();

        page_one.assert_async().await;
        page_two.assert_async().await;
        assert!((catalog.cpu_monthly_price() - 0.02181159 * 744.0).abs() < 1e-9);
        assert!((catalog.memory_monthly_price() - 0.00292353 * 744.0 / GIB).abs() < 1e-15);
        assert!((catalog.storage_monthly_price() - 0.08 / GIB).abs() < 1e-15);
    }

    #[tokio::test]
    async fn test_fetch_catalog_stops_once_complete() {
        let mut server = mockito::Server::new_async().await;

        let body = serde_json::json!({
            "skus": [
                sku("cpu", "E2 Instance Core running in Americas", "h", "0", 21_811_590),
                sku("ram", "E2 Instance Ram running in Americas", "GiBy.h", "0", 2_923_530),
                sku("pd", "Regional Storage PD Capacity in Iowa", "GiBy.mo", "0", 80_000_000),
            ],
            "nextPageToken": "never-followed"
        });
        let mock = server
            .mock("GET", SKUS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "secret").unwrap();
        assert!(client.fetch_catalog(&pricing()).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_skus_fail() {
        let mut server = mockito::Server::new_async().await;

        let body = serde_json::json!({
            "skus": [sku("cpu", "E2 Instance Core running in Americas", "h", "0", 21_811_590)]
        });
        let _mock = server
            .mock("GET", SKUS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "secret").unwrap();
        let error = client.fetch_catalog(&pricing()).await.unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("Couldn't find all price infos"));
        assert!(message.contains("memory, storage"));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", SKUS_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = BillingClient::new(&server.url(), "bad").unwrap();
        let error = client.fetch_catalog(&pricing()).await.unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("403"));
        assert!(message.contains("API key not valid"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(BillingClient::new("not a url", "key").is_err());
    }
}
