//! Records which hooks a dispatch cycle invoked

use jolokia_client::{ConnectionOptions, DispatchError, Response};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    After,
    Success { status: Option<i64> },
    Error { message: String },
}

/// Collects hook invocations in order; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct CallbackRecorder {
    calls: Arc<Mutex<Vec<HookCall>>>,
    responses: Arc<Mutex<Vec<Response>>>,
    failures: Arc<Mutex<Vec<DispatchError>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-call options wired to this recorder
    pub fn options(&self) -> ConnectionOptions {
        self.install(ConnectionOptions::new())
    }

    /// Attach after_dispatch, on_success and on_error hooks to `options`
    pub fn install(&self, options: ConnectionOptions) -> ConnectionOptions {
        let after = self.clone();
        let success = self.clone();
        let error = self.clone();

        options
            .with_after_dispatch(move |_, _| {
                after.push(HookCall::After);
                Ok(())
            })
            .with_on_success(move |response, _| {
                success.push(HookCall::Success {
                    status: response.status_code(),
                });
                success.responses.lock().unwrap().push(response.clone());
            })
            .with_on_error(move |_, options| {
                error.push(HookCall::Error {
                    message: options.error_message().unwrap_or_default(),
                });
                if let Some(failure) = options.failure() {
                    error.failures.lock().unwrap().push(failure.clone());
                }
                Ok(())
            })
    }

    fn push(&self, call: HookCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn success_count(&self) -> usize {
        self.count(|c| matches!(c, HookCall::Success { .. }))
    }

    pub fn error_count(&self) -> usize {
        self.count(|c| matches!(c, HookCall::Error { .. }))
    }

    pub fn after_count(&self) -> usize {
        self.count(|c| matches!(c, HookCall::After))
    }

    /// on_success plus on_error invocations; exactly one per finished cycle
    pub fn terminal_count(&self) -> usize {
        self.success_count() + self.error_count()
    }

    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<DispatchError> {
        self.failures.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&HookCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}
