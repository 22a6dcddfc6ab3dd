//! Deterministic in-memory transfer engine
//!
//! `ScriptedEngine` answers transfers from a routing script instead of the
//! network. It is used by tests, benchmarks and the manager's own test
//! suites to exercise completion handling without sockets.
//!
//! Routes are looked up by `(method, url)` first and then by `url` alone.
//! Unrouted URLs answer `404`.
//!
//! ```
//! use conduit_engine::{Route, ScriptedEngine, ScriptedResponse, TransferEngine};
//! use conduit_core::{Method, RequestSpec};
//!
//! let mut engine = ScriptedEngine::new()
//!     .route("http://svc/items", Route::Respond(ScriptedResponse::ok("[]")))
//!     .route_method(Method::Post, "http://svc/items", Route::Respond(ScriptedResponse::status(405)));
//!
//! let id = engine.create_transfer(&RequestSpec::get("http://svc/items")).unwrap();
//! engine.register(id).unwrap();
//! engine.step();
//! assert_eq!(engine.drain_completed().len(), 1);
//! ```

use crate::traits::{Completion, TransferEngine};
use bytes::Bytes;
use conduit_core::{Error, Method, RequestSpec, Result, TransferCode, TransferId};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::trace;

/// Canned response for a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    /// HTTP status reported
    pub status: u16,
    /// Response body
    pub body: Bytes,
    /// Steps the transfer stays in flight after registration
    pub after_steps: usize,
}

impl ScriptedResponse {
    /// `200` with a body
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            after_steps: 0,
        }
    }

    /// Given status, empty body
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            after_steps: 0,
        }
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Complete only after `steps` further calls to `step`
    pub fn after_steps(mut self, steps: usize) -> Self {
        self.after_steps = steps;
        self
    }
}

/// What a scripted URL does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Answer with a response
    Respond(ScriptedResponse),
    /// Never answer; times out once the request's timeout elapses
    Hang,
    /// Fail as if the host refused the connection
    ConnectFailure,
    /// Refuse to create the transfer at all
    Refuse,
}

/// Order in which a single step reports simultaneously finished transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionOrder {
    /// Oldest transfer first
    #[default]
    Fifo,
    /// Newest transfer first
    Reverse,
}

#[derive(Debug)]
struct ScriptedTransfer {
    route: Route,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    steps_left: usize,
    registered: bool,
}

/// In-memory engine driven by a routing script
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    routes: HashMap<(Option<Method>, String), Route>,
    transfers: BTreeMap<TransferId, ScriptedTransfer>,
    ready: Vec<Completion>,
    next_id: u64,
    capacity: Option<usize>,
    order: CompletionOrder,
    reject_registrations: bool,
    created: u64,
    registered: u64,
    aborted: u64,
    steps: u64,
}

impl ScriptedEngine {
    /// Engine with no routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a URL for any method
    pub fn route(mut self, url: impl Into<String>, route: Route) -> Self {
        self.routes.insert((None, url.into()), route);
        self
    }

    /// Route a URL for one method only
    pub fn route_method(mut self, method: Method, url: impl Into<String>, route: Route) -> Self {
        self.routes.insert((Some(method), url.into()), route);
        self
    }

    /// Refuse new transfers once `capacity` are live
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Order of completions reported by one step
    pub fn completion_order(mut self, order: CompletionOrder) -> Self {
        self.order = order;
        self
    }

    /// Make every subsequent `register` fail
    pub fn reject_registrations(&mut self, reject: bool) {
        self.reject_registrations = reject;
    }

    /// Queue a completion for a transfer this engine never created
    pub fn inject_stray_completion(&mut self, transfer: TransferId) {
        self.ready.push(Completion::without_body(
            transfer,
            TransferCode::Completed { status: 200 },
        ));
    }

    /// Transfers created so far
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Transfers registered so far
    pub fn registered(&self) -> u64 {
        self.registered
    }

    /// Transfers aborted so far
    pub fn aborted(&self) -> u64 {
        self.aborted
    }

    /// Calls to `step` so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn lookup(&self, method: Method, url: &str) -> Route {
        self.routes
            .get(&(Some(method), url.to_string()))
            .or_else(|| self.routes.get(&(None, url.to_string())))
            .cloned()
            .unwrap_or(Route::Respond(ScriptedResponse::status(404)))
    }
}

impl TransferEngine for ScriptedEngine {
    fn create_transfer(&mut self, spec: &RequestSpec) -> Result<TransferId> {
        if !(spec.url().starts_with("http://") || spec.url().starts_with("https://")) {
            return Err(Error::configuration(format!(
                "unsupported url '{}'",
                spec.url()
            )));
        }
        if let Some(capacity) = self.capacity {
            if self.transfers.len() >= capacity {
                return Err(Error::configuration(format!(
                    "engine capacity of {} transfers exhausted",
                    capacity
                )));
            }
        }

        let route = self.lookup(spec.method(), spec.url());
        if route == Route::Refuse {
            return Err(Error::configuration(format!(
                "engine refused '{}'",
                spec.url()
            )));
        }

        let steps_left = match &route {
            Route::Respond(response) => response.after_steps,
            _ => 0,
        };
        self.next_id += 1;
        let id = TransferId::new(self.next_id);
        self.transfers.insert(
            id,
            ScriptedTransfer {
                route,
                timeout: spec.timeout(),
                deadline: None,
                steps_left,
                registered: false,
            },
        );
        self.created += 1;
        Ok(id)
    }

    fn register(&mut self, id: TransferId) -> Result<()> {
        if self.reject_registrations {
            return Err(Error::engine("registrations are rejected"));
        }
        let transfer = self
            .transfers
            .get_mut(&id)
            .ok_or_else(|| Error::engine(format!("{} is unknown", id)))?;
        if transfer.registered {
            return Err(Error::engine(format!("{} is already registered", id)));
        }
        transfer.registered = true;
        transfer.deadline = transfer.timeout.map(|timeout| Instant::now() + timeout);
        self.registered += 1;
        Ok(())
    }

    fn step(&mut self) {
        self.steps += 1;
        let now = Instant::now();
        let mut finished = Vec::new();

        for (id, transfer) in self.transfers.iter_mut() {
            if !transfer.registered {
                continue;
            }
            let completion = match &transfer.route {
                Route::Respond(response) => {
                    if transfer.steps_left > 0 {
                        transfer.steps_left -= 1;
                        None
                    } else {
                        Some(Completion {
                            transfer: *id,
                            code: TransferCode::Completed {
                                status: response.status,
                            },
                            body: response.body.clone(),
                        })
                    }
                }
                Route::Hang => match transfer.deadline {
                    Some(deadline) if now >= deadline => {
                        Some(Completion::without_body(*id, TransferCode::TimedOut))
                    }
                    _ => None,
                },
                Route::ConnectFailure => {
                    Some(Completion::without_body(*id, TransferCode::ConnectFailed))
                }
                // Refused routes never get a transfer
                Route::Refuse => None,
            };
            if let Some(completion) = completion {
                finished.push(completion);
            }
        }

        if self.order == CompletionOrder::Reverse {
            finished.reverse();
        }
        for completion in &finished {
            self.transfers.remove(&completion.transfer);
            trace!(target: "conduit::engine", transfer = %completion.transfer, "scripted transfer finished");
        }
        self.ready.extend(finished);
    }

    fn drain_completed(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.ready)
    }

    fn abort(&mut self, id: TransferId) -> bool {
        let known = if self.transfers.remove(&id).is_some() {
            true
        } else {
            let before = self.ready.len();
            self.ready.retain(|c| c.transfer != id);
            self.ready.len() != before
        };
        if known {
            self.aborted += 1;
        }
        known
    }

    fn in_flight(&self) -> usize {
        self.transfers.len() + self.ready.len()
    }
}
