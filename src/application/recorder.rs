use crate::domain::outcome::WorkflowError;
use crate::domain::payment::{PaymentRecord, PaymentRequest};
use crate::domain::ports::PaymentStoreRef;
use crate::error::PaymentError;
use chrono::Utc;

/// Turns a payment request into a committed [`PaymentRecord`].
///
/// A successful return means the record is durable and visible to later reads
/// through the same store.
#[derive(Clone)]
pub struct PaymentRecorder {
    store: PaymentStoreRef,
}

impl PaymentRecorder {
    pub fn new(store: PaymentStoreRef) -> Self {
        Self { store }
    }

    pub async fn record(&self, request: &PaymentRequest) -> Result<PaymentRecord, WorkflowError> {
        let payment = request.validate(Utc::now()).map_err(|e| match e {
            PaymentError::ValidationError(reason) => WorkflowError::Validation(reason),
            other => WorkflowError::Unexpected(other.to_string()),
        })?;

        self.store
            .commit(payment)
            .await
            .map_err(|e| WorkflowError::Recording(e.to_string()))
    }
}
