use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::core::client::billing::{BillingClient, BillingError, ChargeRequest};

pub struct HttpBillingClient {
    client: Client,
    url: Url,
}

impl HttpBillingClient {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, BillingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl BillingClient for HttpBillingClient {
    async fn charge(&self, request: ChargeRequest) -> Result<(), BillingError> {
        let response = self.client.post(self.url.clone()).json(&request).send().await?;
        match response.status().is_success() {
            true => Ok(()),
            false => Err(BillingError::BillingService(response.status())),
        }
    }
}
