//! Application layer containing the payment-completion workflow.
//!
//! [`workflow::PaymentWorkflow`] drives a [`recorder::PaymentRecorder`] and a
//! [`dispatcher::NotificationDispatcher`] in strict sequence and folds every
//! failure into the returned result.

pub mod dispatcher;
pub mod recorder;
pub mod workflow;
