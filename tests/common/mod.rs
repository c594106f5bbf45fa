#![allow(dead_code)]

use async_trait::async_trait;
use paynotify::application::dispatcher::NotificationDispatcher;
use paynotify::application::recorder::PaymentRecorder;
use paynotify::application::workflow::PaymentWorkflow;
use paynotify::domain::notification::{TransportError, TransportResponse};
use paynotify::domain::payment::{NewPayment, PaymentDetails, PaymentRecord};
use paynotify::domain::ports::{NotificationTransport, PaymentStore, PaymentStoreRef};
use paynotify::error::{PaymentError, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub fn endpoint() -> Url {
    Url::parse("http://notify.test/api/send-email").unwrap()
}

pub fn workflow(store: PaymentStoreRef, transport: Arc<ScriptedTransport>) -> PaymentWorkflow {
    PaymentWorkflow::new(
        PaymentRecorder::new(store.clone()),
        NotificationDispatcher::new(store, transport, endpoint()),
    )
}

/// Transport double that replays scripted replies and counts calls.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<std::result::Result<TransportResponse, TransportError>>>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedTransport {
    pub fn replying(
        replies: impl IntoIterator<Item = std::result::Result<TransportResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn ok(body: &str) -> Arc<Self> {
        Self::replying([Ok(TransportResponse::new(200, Some(body.to_string())))])
    }

    pub fn status(status: u16) -> Arc<Self> {
        Self::replying([Ok(TransportResponse::new(status, None))])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for ScriptedTransport {
    async fn post_json(
        &self,
        _url: &Url,
        payload: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(200, None)))
    }
}

/// Store double whose commits always fail with a constraint violation.
#[derive(Default)]
pub struct RejectingStore {
    commits: AtomicUsize,
}

impl RejectingStore {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStore for RejectingStore {
    async fn commit(&self, _payment: NewPayment) -> Result<PaymentRecord> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Err(PaymentError::ConstraintViolation(
            "FOREIGN KEY constraint \"FK_Pagamentos_Jogos\"".to_string(),
        ))
    }

    async fn fetch_details(&self, payment_id: u64) -> Result<PaymentDetails> {
        Err(PaymentError::NotFound(payment_id))
    }
}

pub fn write_requests_csv(path: &Path, rows: &[(&str, &str, &str, &str)]) -> std::result::Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "user_id,item_id,amount,quantity")?;
    for (user, item, amount, quantity) in rows {
        writeln!(file, "{user},{item},{amount},{quantity}")?;
    }
    file.flush()?;
    Ok(())
}
