use super::notification::{TransportError, TransportResponse};
use super::payment::{NewPayment, PaymentDetails, PaymentRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Durable storage for payments.
///
/// `commit` must be atomic: either the record is visible to a subsequent
/// `fetch_details` or nothing was written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn commit(&self, payment: NewPayment) -> Result<PaymentRecord>;
    async fn fetch_details(&self, payment_id: u64) -> Result<PaymentDetails>;
}

/// Outbound JSON delivery to the notification endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &Url,
        payload: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type NotificationTransportRef = Arc<dyn NotificationTransport>;
