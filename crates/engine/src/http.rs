//! HTTP transfer engine backed by `reqwest`
//!
//! Transfers run as tasks on a private multi-threaded tokio runtime owned by
//! the engine. The runtime's I/O threads make progress on their own; `step`
//! only collects finished transfers from a channel, so neither `step` nor
//! `drain_completed` ever waits on the network.
//!
//! Aborting a registered transfer cancels its task at the next await point
//! and drops any completion it may already have produced.

use crate::traits::{Completion, TransferEngine};
use bytes::Bytes;
use conduit_core::{ClientConfig, Error, Method, RequestSpec, Result, TransferCode, TransferId};
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Transfer engine performing real HTTP requests
pub struct HttpEngine {
    /// `None` only while dropping
    runtime: Option<Runtime>,
    client: reqwest::Client,
    next_id: u64,
    /// Built requests waiting for `register`
    created: HashMap<TransferId, reqwest::Request>,
    /// Spawned transfers not yet collected by `step`
    running: HashMap<TransferId, JoinHandle<()>>,
    /// Collected completions not yet drained
    ready: Vec<Completion>,
    completion_tx: UnboundedSender<Completion>,
    completion_rx: UnboundedReceiver<Completion>,
}

impl HttpEngine {
    /// Create an engine with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create an engine from a client configuration
    ///
    /// # Errors
    /// `Error::Configuration` for invalid settings, `Error::Engine` if the
    /// runtime or HTTP client cannot be built.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let thread_counter = AtomicUsize::new(0);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name_fn(move || {
                format!(
                    "conduit-io-{}",
                    thread_counter.fetch_add(1, Ordering::Relaxed)
                )
            })
            .enable_all()
            .build()
            .map_err(|e| Error::engine(format!("failed to start I/O runtime: {}", e)))?;

        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect);
        if let Some(timeout) = config.default_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::engine(format!("failed to build HTTP client: {}", e)))?;

        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        debug!(
            target: "conduit::engine",
            worker_threads = config.worker_threads,
            "HTTP engine started"
        );

        Ok(Self {
            runtime: Some(runtime),
            client,
            next_id: 0,
            created: HashMap::new(),
            running: HashMap::new(),
            ready: Vec::new(),
            completion_tx,
            completion_rx,
        })
    }

    fn build_request(&self, spec: &RequestSpec) -> Result<reqwest::Request> {
        let url = reqwest::Url::parse(spec.url()).map_err(|e| {
            Error::configuration(format!("invalid url '{}': {}", spec.url(), e))
        })?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::configuration(format!(
                    "unsupported scheme '{}' in '{}'",
                    other,
                    spec.url()
                )))
            }
        }

        let method = match spec.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, url);
        for (name, value) in spec.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = spec.body() {
            builder = builder.body(body.to_owned());
        }
        if let Some(timeout) = spec.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| {
            Error::configuration(format!("cannot build request for '{}': {}", spec.url(), e))
        })
    }
}

impl TransferEngine for HttpEngine {
    fn create_transfer(&mut self, spec: &RequestSpec) -> Result<TransferId> {
        let request = self.build_request(spec)?;
        self.next_id += 1;
        let id = TransferId::new(self.next_id);
        self.created.insert(id, request);
        trace!(target: "conduit::engine", transfer = %id, url = spec.url(), "transfer created");
        Ok(id)
    }

    fn register(&mut self, id: TransferId) -> Result<()> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| Error::engine("engine is shut down"))?;
        let request = self.created.remove(&id).ok_or_else(|| {
            Error::engine(format!("{} is unknown or already registered", id))
        })?;

        let client = self.client.clone();
        let completion_tx = self.completion_tx.clone();
        let task = runtime.spawn(async move {
            let (code, body) = perform(&client, request).await;
            // Receiver only disappears when the engine is dropped.
            let _ = completion_tx.send(Completion {
                transfer: id,
                code,
                body,
            });
        });
        self.running.insert(id, task);
        Ok(())
    }

    fn step(&mut self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.running.remove(&completion.transfer).is_some() {
                self.ready.push(completion);
            } else {
                trace!(
                    target: "conduit::engine",
                    transfer = %completion.transfer,
                    "dropping completion of aborted transfer"
                );
            }
        }
    }

    fn drain_completed(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.ready)
    }

    fn abort(&mut self, id: TransferId) -> bool {
        if self.created.remove(&id).is_some() {
            return true;
        }
        if let Some(task) = self.running.remove(&id) {
            task.abort();
            return true;
        }
        let before = self.ready.len();
        self.ready.retain(|c| c.transfer != id);
        self.ready.len() != before
    }

    fn in_flight(&self) -> usize {
        self.created.len() + self.running.len() + self.ready.len()
    }
}

impl Drop for HttpEngine {
    fn drop(&mut self) {
        for (_, task) in self.running.drain() {
            task.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn perform(client: &reqwest::Client, request: reqwest::Request) -> (TransferCode, Bytes) {
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) => return (classify(&e), Bytes::new()),
    };
    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(body) => (TransferCode::Completed { status }, body),
        Err(e) => (classify(&e), Bytes::new()),
    }
}

/// Timeouts win over connect failures: a connect timeout is still a timeout.
fn classify(e: &reqwest::Error) -> TransferCode {
    if e.is_timeout() {
        TransferCode::TimedOut
    } else if e.is_connect() {
        TransferCode::ConnectFailed
    } else {
        TransferCode::Failed {
            reason: e.to_string(),
        }
    }
}
