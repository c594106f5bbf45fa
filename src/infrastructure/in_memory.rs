use crate::domain::payment::{NewPayment, PaymentDetails, PaymentRecord};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Ledger {
    next_id: u64,
    payments: BTreeMap<u64, PaymentRecord>,
}

/// A thread-safe in-memory payment store.
///
/// Ids are handed out sequentially. The id is allocated and the record
/// inserted under a single write lock, so a commit is all-or-nothing.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl Default for InMemoryPaymentStore {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose first committed payment gets `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger {
                next_id: first_id,
                payments: BTreeMap::new(),
            })),
        }
    }

    pub async fn get(&self, payment_id: u64) -> Option<PaymentRecord> {
        self.ledger.read().await.payments.get(&payment_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.ledger.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn commit(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let mut ledger = self.ledger.write().await;
        let id = ledger.next_id;
        let next_id = id.checked_add(1).ok_or_else(|| {
            PaymentError::ConstraintViolation("payment id sequence exhausted".to_string())
        })?;

        let record = payment.into_record(id);
        ledger.payments.insert(id, record.clone());
        ledger.next_id = next_id;
        Ok(record)
    }

    async fn fetch_details(&self, payment_id: u64) -> Result<PaymentDetails> {
        let ledger = self.ledger.read().await;
        ledger
            .payments
            .get(&payment_id)
            .map(PaymentRecord::details)
            .ok_or(PaymentError::NotFound(payment_id))
    }
}
