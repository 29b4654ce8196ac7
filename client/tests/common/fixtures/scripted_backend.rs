//! In-process transport backend with scripted behavior

use async_trait::async_trait;
use jolokia_client::{
    EffectiveOptions, Message, Method, Request, TransportBackend, TransportError, WirePayload,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Script {
    Reply(WirePayload),
    Fail(TransportError),
}

/// Backend that answers every exchange with the same scripted result
pub struct ScriptedBackend {
    script: Script,
    delay: Option<Duration>,
    allow_get: bool,
    exchanges: AtomicUsize,
    aborts: AtomicUsize,
    seen_bodies: Mutex<Vec<String>>,
    seen_options: Mutex<Vec<EffectiveOptions>>,
}

impl ScriptedBackend {
    pub fn replying(payload: impl Into<WirePayload>) -> Self {
        Self::new(Script::Reply(payload.into()))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::new(Script::Fail(error))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            allow_get: false,
            exchanges: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
            seen_bodies: Mutex::new(Vec::new()),
            seen_options: Mutex::new(Vec::new()),
        }
    }

    /// Hold every reply back for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn allowing_get(mut self) -> Self {
        self.allow_get = true;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    pub fn seen_bodies(&self) -> Vec<String> {
        self.seen_bodies.lock().unwrap().clone()
    }

    pub fn seen_options(&self) -> Vec<EffectiveOptions> {
        self.seen_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn supports_method(&self, method: Method) -> bool {
        method == Method::Post || self.allow_get
    }

    async fn exchange(
        &self,
        request: &Request,
        options: &EffectiveOptions,
    ) -> Result<WirePayload, TransportError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let body = request
            .to_wire_string(None)
            .map_err(|e| TransportError::Encode { reason: e.to_string() })?;
        self.seen_bodies.lock().unwrap().push(body);
        self.seen_options.lock().unwrap().push(options.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Reply(payload) => Ok(payload.clone()),
            Script::Fail(error) => Err(error.clone()),
        }
    }

    fn abort(&self, _request: &Request) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}
