use crate::domain::notification::{DispatchFailure, NotificationOutcome, TransportError};
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{NotificationTransportRef, PaymentStoreRef};
use std::time::Duration;
use url::Url;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers the details of a committed payment to the notification endpoint.
///
/// Every way this can go wrong comes back as a [`DispatchFailure`]; nothing
/// here can touch the record that was already committed.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: PaymentStoreRef,
    transport: NotificationTransportRef,
    endpoint: Url,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(store: PaymentStoreRef, transport: NotificationTransportRef, endpoint: Url) -> Self {
        Self {
            store,
            transport,
            endpoint,
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn notify(
        &self,
        record: &PaymentRecord,
    ) -> Result<NotificationOutcome, DispatchFailure> {
        let details = self
            .store
            .fetch_details(record.id)
            .await
            .map_err(|e| DispatchFailure::DetailsUnavailable(e.to_string()))?;
        let payload = serde_json::to_value(&details)
            .map_err(|e| DispatchFailure::DetailsUnavailable(e.to_string()))?;

        let response = tokio::time::timeout(
            self.timeout,
            self.transport.post_json(&self.endpoint, &payload),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;

        if !response.is_success() {
            return Err(DispatchFailure::Rejected {
                status: response.status,
            });
        }

        Ok(NotificationOutcome::from_body(response.body.as_deref()))
    }
}
