//! Reqwest-backed notification transport.
//!
//! This adapter owns transport details only: the client timeout, JSON
//! serialisation and mapping reqwest failures onto [`TransportError`].
//! Deciding what a status code means is left to the dispatcher.

use crate::domain::notification::{TransportError, TransportResponse};
use crate::domain::ports::NotificationTransport;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("paynotify/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &Url,
        payload: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        // Once a status is in hand the call counts as answered; the body is best-effort.
        let status = response.status().as_u16();
        let body = response.text().await.ok().filter(|body| !body.is_empty());

        Ok(TransportResponse::new(status, body))
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }
    if error.is_connect() {
        return TransportError::Connect(error.to_string());
    }
    TransportError::Request(error.to_string())
}
