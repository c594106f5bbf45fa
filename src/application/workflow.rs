use super::dispatcher::NotificationDispatcher;
use super::recorder::PaymentRecorder;
use crate::domain::notification::{DispatchFailure, NotificationOutcome};
use crate::domain::outcome::{ResultAggregator, WorkflowError, WorkflowResult};
use crate::domain::payment::{PaymentRecord, PaymentRequest, PaymentView};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

/// The payment-completion workflow: record, then notify, then report.
///
/// Recording and notification are two separate stages. The first one decides
/// whether there is a payload at all; the second can only ever add a warning.
#[derive(Clone)]
pub struct PaymentWorkflow {
    recorder: PaymentRecorder,
    dispatcher: NotificationDispatcher,
}

impl PaymentWorkflow {
    pub fn new(recorder: PaymentRecorder, dispatcher: NotificationDispatcher) -> Self {
        Self {
            recorder,
            dispatcher,
        }
    }

    /// Runs the workflow once. Always returns a result, never an error.
    pub async fn complete(&self, request: PaymentRequest) -> WorkflowResult<PaymentView> {
        self.complete_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like [`PaymentWorkflow::complete`], but observes `cancel`.
    ///
    /// Cancellation before recording aborts the run with no record. Once the
    /// commit has started it runs to completion; cancellation observed after
    /// that abandons the notification and reports it as a dispatch failure.
    pub async fn complete_with_cancellation(
        &self,
        request: PaymentRequest,
        cancel: &CancellationToken,
    ) -> WorkflowResult<PaymentView> {
        let span = info_span!(
            "complete_payment",
            user_id = request.user_id,
            item_id = request.item_id
        );
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: PaymentRequest,
        cancel: &CancellationToken,
    ) -> WorkflowResult<PaymentView> {
        let mut result = ResultAggregator::new();

        info!(
            user_id = request.user_id,
            item_id = request.item_id,
            amount = %request.amount,
            quantity = request.quantity,
            "starting payment"
        );

        let record = match self.record_stage(&request, cancel).await {
            Ok(record) => record,
            Err(failure) => {
                match &failure {
                    WorkflowError::Validation(reason) => warn!(
                        user_id = request.user_id,
                        item_id = request.item_id,
                        reason = %reason,
                        "payment request rejected"
                    ),
                    other => error!(
                        user_id = request.user_id,
                        item_id = request.item_id,
                        error = %other,
                        "could not complete payment"
                    ),
                }
                result.record_failure(failure);
                return result.build();
            }
        };

        result.set_payload(record.view());

        match self.dispatch_stage(&record, cancel).await {
            Ok(outcome) => {
                let reply_date = outcome.date.map(|d| d.to_rfc3339());
                info!(
                    payment_id = record.id,
                    reply_message = outcome.message.as_deref(),
                    reply_date = reply_date.as_deref(),
                    "notification endpoint replied"
                );
            }
            Err(failure) => {
                match &failure {
                    DispatchFailure::Unexpected(_) => error!(
                        payment_id = record.id,
                        user_id = record.user_id,
                        item_id = record.item_id,
                        reason = failure.reason(),
                        error = %failure,
                        "notification stage failed unexpectedly"
                    ),
                    _ => warn!(
                        payment_id = record.id,
                        user_id = record.user_id,
                        item_id = record.item_id,
                        reason = failure.reason(),
                        status_code = failure.status_code(),
                        error = %failure,
                        "notification endpoint did not process payment details"
                    ),
                }
                result.record_failure(failure.into());
            }
        }

        info!(
            payment_id = record.id,
            user_id = record.user_id,
            item_id = record.item_id,
            "payment completed"
        );

        result.build()
    }

    async fn record_stage(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentRecord, WorkflowError> {
        if cancel.is_cancelled() {
            return Err(WorkflowError::Recording(
                "cancelled before recording started".to_string(),
            ));
        }
        guarded(self.recorder.record(request))
            .await
            .map_err(WorkflowError::Unexpected)?
    }

    /// Failures here, panics included, only ever become a [`DispatchFailure`].
    async fn dispatch_stage(
        &self,
        record: &PaymentRecord,
        cancel: &CancellationToken,
    ) -> Result<NotificationOutcome, DispatchFailure> {
        let notify = guarded(self.dispatcher.notify(record));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchFailure::Cancelled),
            outcome = notify => outcome.unwrap_or_else(|panic| Err(DispatchFailure::Unexpected(panic))),
        }
    }
}

/// Runs a stage and hands back the panic message if a collaborator panics.
async fn guarded<F>(stage: F) -> Result<F::Output, String>
where
    F: Future,
{
    AssertUnwindSafe(stage)
        .catch_unwind()
        .await
        .map_err(|panic| panic_message(panic.as_ref()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
