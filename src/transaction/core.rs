use super::registry::{RegistryView, TransactionRegistry};
use crate::config::TransactionConfig;
use crate::dispatcher::{bind_parameters, decode_body, execute_handler, Handler, HandlerParameters};
use crate::error::{ErrorCode, TransactionError};
use crate::ids::TransactionId;
use crate::negotiation::{
    check_response_charset, check_response_media_type, extract_body_spec, extract_response_spec,
};
use crate::server::{TransactionRequest, TransactionResponse};
use crate::spec::RouteMatch;
use futures::FutureExt;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use serde::Serialize;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Receiving end of the transport boundary; resolves with the final response.
pub type ResponseReceiver = oneshot::Receiver<TransactionResponse>;

/// Upstream correlation header reused as the transaction id when it holds a free ULID.
pub const CORRELATION_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionState {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

impl TransactionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

struct Slot {
    reply_tx: oneshot::Sender<TransactionResponse>,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    state: TransactionState,
    slot: Option<Slot>,
}

struct Shared {
    id: TransactionId,
    started_at: Instant,
    registry: TransactionRegistry,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `response` and move to the terminal `state` if nothing else has; the
    /// loser of the race gets `false`.
    fn finish(&self, response: TransactionResponse, state: TransactionState) -> bool {
        let slot = {
            let mut inner = self.lock();
            let Some(slot) = inner.slot.take() else {
                return false;
            };
            inner.state = state;
            self.registry.remove(&self.id);
            slot
        };

        if state != TransactionState::TimedOut {
            if let Some(timer) = slot.timer {
                timer.abort();
            }
        }

        let status = response.status;
        if slot.reply_tx.send(response).is_err() {
            debug!(transaction_id = %self.id, "Transport dropped before the response was delivered");
        }

        info!(
            transaction_id = %self.id,
            status = status,
            state = ?state,
            latency_ms = self.started_at.elapsed().as_millis() as u64,
            "Transaction ended"
        );
        true
    }

    fn time_out(&self, timeout_ms: u64) -> bool {
        let err = TransactionError::new(ErrorCode::TransactionTimeout, [timeout_ms.to_string()]);
        let delivered = self.finish(error_response(self.id, &err), TransactionState::TimedOut);
        if delivered {
            warn!(
                transaction_id = %self.id,
                timeout_ms = timeout_ms,
                "Transaction timed out"
            );
        }
        delivered
    }
}

/// Build the JSON error response for `err`.
///
/// Body: `{ "error", "error_description", "transaction", "params" }`. Headers carried by
/// the error are copied over.
#[must_use]
pub fn error_response(id: TransactionId, err: &TransactionError) -> TransactionResponse {
    let mut headers = err.headers().clone();
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    let body = json!({
        "error": err.code().as_str(),
        "error_description": err.description(),
        "transaction": id.to_string(),
        "params": err.params(),
    });
    TransactionResponse::new(err.status().as_u16(), headers, Some(body))
}

/// One request/response exchange.
///
/// Cheap to clone; every clone drives the same transaction. Exactly one of
/// [`end`](Transaction::end) or the timeout delivers the final response.
#[derive(Clone)]
pub struct Transaction {
    shared: Arc<Shared>,
    request: Arc<TransactionRequest>,
    config: Arc<TransactionConfig>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.shared.id)
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .field("state", &self.state())
            .finish()
    }
}

impl Transaction {
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.shared.id
    }

    #[must_use]
    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.shared.lock().state
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.shared.started_at.elapsed()
    }

    /// Negotiate, bind parameters, decode the body and invoke the handler.
    ///
    /// When the handler sets no `Content-Type` on a response with a body, the most
    /// preferred negotiated media type is used.
    pub async fn start(
        &self,
        route: &RouteMatch,
        handler: &dyn Handler,
    ) -> Result<TransactionResponse, TransactionError> {
        let request = self.request.as_ref();
        let operation = route.operation.as_ref();

        let consumable_charsets = self.charsets_or_default(&operation.consumable_charsets);
        let body_spec =
            extract_body_spec(request, &operation.consumable_media_types, consumable_charsets)?;

        let producible_charsets = self.charsets_or_default(&operation.producible_charsets);
        let response_spec = extract_response_spec(
            operation,
            request,
            &operation.producible_media_types,
            producible_charsets,
        );
        check_response_charset(request, &response_spec, producible_charsets)?;
        // Operations producing nothing (e.g. 204 only) put no constraint on `Accept`.
        if !operation.producible_media_types.is_empty() {
            check_response_media_type(request, &response_spec, &operation.producible_media_types)?;
        }

        let values = bind_parameters(route, request, &self.config.coercion_options())?;
        let body = decode_body(&body_spec, request.body.as_deref(), self.config.max_body_length)?;

        debug!(
            transaction_id = %self.shared.id,
            operation_id = %operation.operation_id,
            parameters = values.len(),
            has_body = body.is_some(),
            "Transaction inputs ready"
        );

        let parameters = HandlerParameters {
            transaction_id: self.shared.id,
            values,
            body,
            body_spec,
            response_spec: response_spec.clone(),
        };
        let mut response = execute_handler(operation, handler, parameters).await?;

        if response.body.is_some() && !response.headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = response_spec
                .content_types
                .first()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
            {
                response.headers.insert(CONTENT_TYPE, content_type);
            }
        }
        Ok(response)
    }

    fn charsets_or_default<'a>(&'a self, declared: &'a [String]) -> &'a [String] {
        if declared.is_empty() {
            self.config.default_charsets.as_slice()
        } else {
            declared
        }
    }

    /// Map any error onto a response. Never fails.
    ///
    /// Only builds the response; the terminal state is set by whichever of
    /// [`end`](Transaction::end) or [`end_failed`](Transaction::end_failed) delivers it.
    pub fn catch(&self, err: &TransactionError) -> TransactionResponse {
        let status = err.status();
        if status.is_server_error() {
            error!(
                transaction_id = %self.shared.id,
                code = err.code().as_str(),
                status = status.as_u16(),
                params = ?err.params(),
                error = %err,
                "Transaction failed"
            );
        } else {
            info!(
                transaction_id = %self.shared.id,
                code = err.code().as_str(),
                status = status.as_u16(),
                params = ?err.params(),
                "Transaction rejected"
            );
        }
        error_response(self.shared.id, err)
    }

    /// Deliver the final response and release the transaction.
    ///
    /// Returns `false` when the transaction was already ended or timed out; the
    /// response is then dropped.
    pub fn end(&self, response: TransactionResponse) -> bool {
        self.deliver(response, TransactionState::Completed)
    }

    /// Like [`end`](Transaction::end), but the transaction ends as `Failed`.
    pub fn end_failed(&self, response: TransactionResponse) -> bool {
        self.deliver(response, TransactionState::Failed)
    }

    fn deliver(&self, response: TransactionResponse, state: TransactionState) -> bool {
        let delivered = self.shared.finish(response, state);
        if !delivered {
            debug!(transaction_id = %self.shared.id, "Late response ignored");
        }
        delivered
    }
}

/// Creates transactions and owns their registry.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    registry: TransactionRegistry,
    config: Arc<TransactionConfig>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(TransactionConfig::default())
    }
}

impl TransactionManager {
    #[must_use]
    pub fn new(config: TransactionConfig) -> Self {
        Self::with_registry(config, TransactionRegistry::new())
    }

    #[must_use]
    pub fn with_registry(config: TransactionConfig, registry: TransactionRegistry) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> RegistryView {
        self.registry.view()
    }

    /// Register a pending transaction and arm its timeout.
    ///
    /// A valid ULID in [`CORRELATION_HEADER`] becomes the transaction id unless a pending
    /// transaction already holds it. Must be called from within a tokio runtime.
    pub fn create(&self, request: TransactionRequest) -> (Transaction, ResponseReceiver) {
        let started_at = Instant::now();
        let candidate = TransactionId::from_header_or_new(request.header(CORRELATION_HEADER));
        let entry = self.registry.register(
            candidate,
            request.method.as_str(),
            &request.path,
            started_at,
        );
        let (reply_tx, reply_rx) = oneshot::channel();

        let shared = Arc::new(Shared {
            id: entry.id,
            started_at,
            registry: self.registry.clone(),
            inner: Mutex::new(Inner {
                state: TransactionState::Pending,
                slot: Some(Slot {
                    reply_tx,
                    timer: None,
                }),
            }),
        });

        let timeout = self.config.timeout();
        let timeout_ms = self.config.timeout_ms;
        let timer = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                tokio::time::sleep(timeout).await;
                shared.time_out(timeout_ms);
            }
        });
        if let Some(slot) = shared.lock().slot.as_mut() {
            slot.timer = Some(timer);
        }

        info!(
            transaction_id = %entry.id,
            method = %request.method,
            path = %request.path,
            timeout_ms = timeout_ms,
            "Transaction created"
        );

        let transaction = Transaction {
            shared,
            request: Arc::new(request),
            config: Arc::clone(&self.config),
        };
        (transaction, reply_rx)
    }

    /// Drive a request through the whole pipeline and wait for its final response.
    ///
    /// The pipeline runs on its own task so a slow handler keeps running after the
    /// timeout answered; its result is then ignored. Handler panics become
    /// `E_UNEXPECTED` responses.
    pub async fn run(
        &self,
        request: TransactionRequest,
        route: RouteMatch,
        handler: Arc<dyn Handler>,
    ) -> TransactionResponse {
        let (transaction, receiver) = self.create(request);
        let id = transaction.id();

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(transaction.start(&route, handler.as_ref()))
                .catch_unwind()
                .await;
            let err = match outcome {
                Ok(Ok(response)) => {
                    transaction.end(response);
                    return;
                }
                Ok(Err(err)) => err,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        transaction_id = %transaction.id(),
                        operation_id = %route.operation.operation_id,
                        panic = %message,
                        "Handler panicked"
                    );
                    TransactionError::new(ErrorCode::Unexpected, [message])
                }
            };
            transaction.end_failed(transaction.catch(&err));
        });

        match receiver.await {
            Ok(response) => response,
            Err(_) => {
                error!(transaction_id = %id, "Transaction dropped without a response");
                error_response(
                    id,
                    &TransactionError::new(ErrorCode::Unexpected, ["no response delivered"]),
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
