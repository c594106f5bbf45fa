//! Result aggregation for a single workflow run.
//!
//! A [`ResultAggregator`] is created empty when a run starts, collects the
//! payload and notices as the stages complete, and is turned into the
//! [`WorkflowResult`] handed back to the caller.

use super::notification::DispatchFailure;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const PAYMENT_FAILED_NOTICE: &str = "Could not complete payment.";
pub const DISPATCH_WARNING_NOTICE: &str =
    "Warning: the notification endpoint did not process the payment details correctly.";

/// Tagged cause behind every notice the workflow raises.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("invalid payment request: {0}")]
    Validation(String),
    #[error("payment could not be recorded: {0}")]
    Recording(String),
    #[error("notification dispatch failed: {0}")]
    Dispatch(#[from] DispatchFailure),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    /// The user-facing text for this cause.
    pub fn notice(&self) -> String {
        match self {
            WorkflowError::Validation(reason) => format!("Invalid payment request: {reason}"),
            WorkflowError::Recording(_) | WorkflowError::Unexpected(_) => {
                PAYMENT_FAILED_NOTICE.to_string()
            }
            WorkflowError::Dispatch(_) => DISPATCH_WARNING_NOTICE.to_string(),
        }
    }
}

/// Mutable accumulator for one run. A payload, once set, stays set.
#[derive(Debug)]
pub struct ResultAggregator<T> {
    payload: Option<T>,
    notices: Vec<String>,
    failures: Vec<WorkflowError>,
}

impl<T> Default for ResultAggregator<T> {
    fn default() -> Self {
        Self {
            payload: None,
            notices: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> ResultAggregator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_payload(&mut self, value: T) {
        self.payload = Some(value);
    }

    pub fn add_notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    /// Appends the failure's notice and keeps the tagged cause alongside it.
    pub fn record_failure(&mut self, failure: WorkflowError) {
        self.notices.push(failure.notice());
        self.failures.push(failure);
    }

    pub fn build(self) -> WorkflowResult<T> {
        WorkflowResult {
            payload: self.payload,
            notices: self.notices,
            failures: self.failures,
        }
    }
}

/// What the caller gets back from every run, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult<T> {
    payload: Option<T>,
    notices: Vec<String>,
    failures: Vec<WorkflowError>,
}

impl<T> WorkflowResult<T> {
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Notices in the order they were raised.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn failures(&self) -> &[WorkflowError] {
        &self.failures
    }

    /// Payload present and nothing to report.
    pub fn is_success(&self) -> bool {
        self.payload.is_some() && self.notices.is_empty()
    }

    /// Payload present, but something went wrong after it was produced.
    pub fn is_degraded(&self) -> bool {
        self.payload.is_some() && !self.notices.is_empty()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<T: Serialize> Serialize for WorkflowResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a, T> {
            payload: &'a Option<T>,
            notices: &'a [String],
        }

        View {
            payload: &self.payload,
            notices: &self.notices,
        }
        .serialize(serializer)
    }
}
