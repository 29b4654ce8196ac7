//! A single dispatch cycle
//!
//! ```text
//! Idle → OptionsResolved → ShortCircuited ─────────────────────┐
//!                        ↘ BackendInvoked → TimedOut ──────────┤→ Terminated
//!                                         ↘ BackendCompleted ──┘
//! ```
//!
//! The terminal routing (`on_dispatch_success` / `on_dispatch_error`) is
//! public so custom drivers can reuse the callback conventions.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EffectiveOptions;
use crate::errors::{DispatchError, TransportError};
use crate::http::TransportBackend;
use crate::message::{Request, Response, WirePayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    OptionsResolved,
    ShortCircuited,
    BackendInvoked,
    TimedOut,
    BackendCompleted,
    Terminated,
}

impl DispatchState {
    pub fn can_advance_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, OptionsResolved)
                | (OptionsResolved, ShortCircuited)
                | (OptionsResolved, BackendInvoked)
                | (BackendInvoked, TimedOut)
                | (BackendInvoked, BackendCompleted)
                | (ShortCircuited, Terminated)
                | (TimedOut, Terminated)
                | (BackendCompleted, Terminated)
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a dispatch cycle ended. Diagnostic only; the hooks are authoritative.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Delivered successfully. The response is present when `on_success` was configured.
    Succeeded(Option<Response>),
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded(_))
    }
}

/// What arrived from the backend, or from a short-circuiting `before_dispatch`
#[derive(Debug, Clone)]
pub enum Inbound {
    Wire(WirePayload),
    Response(Response),
}

impl Inbound {
    fn is_empty(&self) -> bool {
        match self {
            Inbound::Wire(payload) => payload.is_empty(),
            Inbound::Response(_) => false,
        }
    }
}

pub(crate) struct DispatchCycle {
    id: Uuid,
    state: DispatchState,
}

impl DispatchCycle {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: DispatchState::Idle,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn advance(&mut self, next: DispatchState) {
        if !self.state.can_advance_to(next) {
            warn!(cycle = %self.id, "Unexpected dispatch transition {} -> {}", self.state, next);
        }
        debug!(cycle = %self.id, "Dispatch state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Deliver a response supplied by `before_dispatch`
    pub(crate) fn finish_short_circuit(
        mut self,
        request: Request,
        response: Response,
        mut options: EffectiveOptions,
    ) -> DispatchOutcome {
        let outcome = on_dispatch_success(&request, Inbound::Response(response), &mut options);
        self.advance(DispatchState::Terminated);
        outcome
    }

    /// Race the backend exchange against the dispatch timer and route the result
    pub(crate) async fn run_exchange(
        mut self,
        backend: Arc<dyn TransportBackend>,
        request: Request,
        mut options: EffectiveOptions,
    ) -> DispatchOutcome {
        self.advance(DispatchState::BackendInvoked);
        let started = Instant::now();

        let result = tokio::time::timeout(options.timeout, backend.exchange(&request, &options)).await;

        let outcome = match result {
            Ok(Ok(payload)) => {
                self.advance(DispatchState::BackendCompleted);
                debug!(
                    "Backend {} completed in {}ms",
                    backend.name(),
                    started.elapsed().as_millis()
                );
                on_dispatch_success(&request, Inbound::Wire(payload), &mut options)
            }
            Ok(Err(e)) => {
                self.advance(DispatchState::BackendCompleted);
                warn!("Backend {} failed: {}", backend.name(), e);
                options.set_failure(DispatchError::Transport(e));
                on_dispatch_error(&request, &mut options)
            }
            Err(_) => {
                self.advance(DispatchState::TimedOut);
                backend.abort(&request);
                let failure = DispatchError::Timeout {
                    timeout_ms: options.timeout_ms(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                warn!("{}", failure);
                options.set_failure(failure);
                on_dispatch_error(&request, &mut options)
            }
        };

        self.advance(DispatchState::Terminated);
        outcome
    }
}

/// Success branch of a dispatch cycle.
///
/// An empty payload is routed to [`on_dispatch_error`]. Otherwise `after_dispatch`
/// runs, and if `on_success` is configured the response is materialized, linked
/// to `request` and classified by status. Non-200 responses and payloads that
/// cannot be decoded go to `on_error` instead.
pub fn on_dispatch_success(
    request: &Request,
    inbound: Inbound,
    options: &mut EffectiveOptions,
) -> DispatchOutcome {
    if inbound.is_empty() {
        options.set_failure(DispatchError::EmptyPayload);
        return on_dispatch_error(request, options);
    }

    run_after_dispatch(request, options);

    let Some(on_success) = options.on_success.clone() else {
        debug!("No on_success hook configured; response not materialized");
        return DispatchOutcome::Succeeded(None);
    };

    let mut response = match inbound {
        Inbound::Response(response) => response,
        Inbound::Wire(payload) => {
            let raw = payload.to_display_string();
            match Response::from_wire_payload(payload) {
                Ok(response) => response,
                Err(e) => {
                    let failure = DispatchError::InvalidResponse {
                        reason: e.to_string(),
                        payload: raw,
                    };
                    options.set_failure(failure.clone());
                    notify_error(request, options);
                    return DispatchOutcome::Failed(failure);
                }
            }
        }
    };
    response.set_request(request.clone());

    if !response.is_success() {
        let failure = DispatchError::ErrorStatus {
            status: response.status_code(),
            error: response.error_text(),
            response: Box::new(response),
        };
        info!("{}", failure);
        options.set_failure(failure.clone());
        notify_error(request, options);
        return DispatchOutcome::Failed(failure);
    }

    invoke_guarded("on_success", || {
        on_success(&response, request);
        Ok(())
    });
    DispatchOutcome::Succeeded(Some(response))
}

/// Error branch of a dispatch cycle: `after_dispatch`, then `on_error`.
///
/// The caller sets the failure on `options` first. Hook failures are logged and dropped.
pub fn on_dispatch_error(request: &Request, options: &mut EffectiveOptions) -> DispatchOutcome {
    run_after_dispatch(request, options);
    notify_error(request, options);

    let failure = options.failure().cloned().unwrap_or_else(|| {
        DispatchError::Transport(TransportError::Other("unspecified dispatch failure".to_string()))
    });
    DispatchOutcome::Failed(failure)
}

fn run_after_dispatch(request: &Request, options: &EffectiveOptions) {
    if let Some(hook) = options.after_dispatch.clone() {
        invoke_guarded("after_dispatch", || hook(request, options));
    }
}

fn notify_error(request: &Request, options: &EffectiveOptions) {
    if let Some(hook) = options.on_error.clone() {
        invoke_guarded("on_error", || hook(request, options));
    }
}

/// Run an application hook; errors and panics are logged and discarded
fn invoke_guarded<F>(hook: &'static str, f: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(hook, "Hook failed, ignoring: {}", e),
        Err(_) => warn!(hook, "Hook panicked, ignoring"),
    }
}
