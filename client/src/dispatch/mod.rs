// File: client/src/dispatch/mod.rs
//! Request dispatching
//!
//! [`Dispatcher::dispatch`] resolves options, runs `before_dispatch` and then
//! hands the rest of the cycle to a spawned task. Every cycle ends in exactly
//! one of `on_success` / `on_error`, unless `before_dispatch` itself fails, in
//! which case the error goes straight back to the caller.

pub mod cycle;

use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, Instrument};
use uuid::Uuid;

use crate::config::{ClientConfig, ConnectionOptions, EffectiveOptions, OptionsResolver};
use crate::errors::{ClientError, ConfigError, DispatchError, TransportError};
use crate::http::{HttpBackend, TransportBackend};
use crate::message::{Message, Request, Response};

pub use cycle::{on_dispatch_error, on_dispatch_success, DispatchOutcome, DispatchState, Inbound};

use cycle::DispatchCycle;

static SHARED: OnceLock<Dispatcher> = OnceLock::new();

/// Drives dispatch cycles against one set of library defaults
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ClientConfig>,
    backend: Arc<dyn TransportBackend>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(config: ClientConfig, backend: Arc<dyn TransportBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    /// Dispatcher with the library defaults and the HTTP backend, used by [`Request::post`]
    pub fn shared() -> &'static Dispatcher {
        SHARED.get_or_init(|| Dispatcher::new(ClientConfig::default(), Arc::new(HttpBackend::new())))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn resolve(
        &self,
        request: &Request,
        options: Option<&ConnectionOptions>,
    ) -> Result<EffectiveOptions, ConfigError> {
        OptionsResolver::new(&self.config).resolve(request, options)
    }

    /// Start a dispatch cycle for `request`.
    ///
    /// Returns once the exchange is under way; the outcome is delivered
    /// through the hooks. Must be called within a tokio runtime.
    pub fn dispatch(
        &self,
        request: &Request,
        options: Option<ConnectionOptions>,
    ) -> Result<DispatchHandle, ClientError> {
        let mut cycle = DispatchCycle::new();
        let id = cycle.id();

        let effective = self.resolve(request, options.as_ref())?;
        cycle.advance(DispatchState::OptionsResolved);

        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        if let Some(indent) = self.config.wire_indent.as_deref() {
            if let Ok(body) = request.to_wire_string(Some(indent)) {
                trace!(cycle = %id, "Outbound request:\n{}", body);
            }
        }

        // The cycle owns its own snapshot of the request
        let request = request.clone();
        let span = tracing::debug_span!("dispatch", cycle = %id, url = %effective.url);

        if let Some(hook) = effective.before_dispatch.clone() {
            let short_circuit = hook(&request, &effective).map_err(ClientError::Hook)?;
            if let Some(response) = short_circuit {
                info!(cycle = %id, "before_dispatch supplied a response; skipping backend");
                cycle.advance(DispatchState::ShortCircuited);
                let join = runtime.spawn(
                    async move { cycle.finish_short_circuit(request, response, effective) }
                        .instrument(span),
                );
                return Ok(DispatchHandle { id, join });
            }
        }

        let backend = request.backend().cloned().unwrap_or_else(|| self.backend.clone());
        if !backend.supports_method(effective.method) {
            return Err(ConfigError::UnsupportedMethod {
                method: effective.method.to_string(),
                backend: backend.name().to_string(),
            }
            .into());
        }

        debug!(cycle = %id, "Dispatching via {} backend", backend.name());
        let join = runtime.spawn(cycle.run_exchange(backend, request, effective).instrument(span));
        Ok(DispatchHandle { id, join })
    }

    /// Dispatch and wait for the outcome.
    ///
    /// A no-op `on_success` is installed when none is configured so the
    /// response is always materialized.
    pub async fn send(
        &self,
        request: &Request,
        options: Option<ConnectionOptions>,
    ) -> Result<Response, ClientError> {
        let mut options = options.unwrap_or_default();
        if options.on_success.is_none() && self.resolve(request, Some(&options))?.on_success.is_none() {
            options.on_success = Some(Arc::new(|_: &Response, _: &Request| {}));
        }

        match self.dispatch(request, Some(options))?.outcome().await {
            DispatchOutcome::Succeeded(Some(response)) => Ok(response),
            DispatchOutcome::Succeeded(None) => Err(ClientError::Dispatch(DispatchError::InvalidResponse {
                reason: "response was not materialized".to_string(),
                payload: String::new(),
            })),
            DispatchOutcome::Failed(e) => Err(ClientError::Dispatch(e)),
        }
    }
}

/// Handle to a running dispatch cycle. Dropping it does not cancel the cycle.
#[derive(Debug)]
pub struct DispatchHandle {
    id: Uuid,
    join: JoinHandle<DispatchOutcome>,
}

impl DispatchHandle {
    /// Identifier carried by this cycle's log records
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the cycle to terminate
    pub async fn outcome(self) -> DispatchOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => DispatchOutcome::Failed(DispatchError::Transport(TransportError::Other(
                format!("dispatch task failed: {}", e),
            ))),
        }
    }
}
