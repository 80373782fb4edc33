//! Generic runtime for request orchestration.
//!
//! The Runtime drives the app's request loop, coordinating between:
//! - [`ForumApp`]: the state machine
//! - [`Bridge`]: request execution through a [`Transport`]
//!
//! Requests run concurrently. Completions are fed back one at a time in the
//! order they finish, which is exactly the ordering the app's stale-response
//! rules are written against.

use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use petboard_client::Transport;
use tokio::sync::mpsc;

use crate::{AppAction, AppEvent, Bridge, ForumApp};

/// A user intent delivered to [`Runtime::run`].
pub type Intent = Box<dyn FnOnce(&mut ForumApp) -> Vec<AppAction> + Send>;

/// Generic runtime that orchestrates [`ForumApp`] and [`Bridge`].
pub struct Runtime<T: Transport> {
    app: ForumApp,
    bridge: Bridge<T>,
    in_flight: FuturesUnordered<BoxFuture<'static, AppEvent>>,
    renders: u64,
}

impl<T: Transport> Runtime<T> {
    /// Create a runtime for `app` over `transport`.
    pub fn new(app: ForumApp, transport: T) -> Self {
        Self { app, bridge: Bridge::new(transport), in_flight: FuturesUnordered::new(), renders: 0 }
    }

    /// Run an intent against the app and dispatch its actions.
    pub fn apply(&mut self, intent: impl FnOnce(&mut ForumApp) -> Vec<AppAction>) {
        let actions = intent(&mut self.app);
        self.dispatch(actions);
    }

    /// Start every request in `actions`.
    pub fn dispatch(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render => self.renders += 1,
                AppAction::Request(call) => {
                    tracing::trace!(?call, "dispatch");
                    self.in_flight.push(self.bridge.execute(call));
                },
            }
        }
    }

    /// Wait for the next completion and process it.
    ///
    /// Returns `false` if nothing was in flight.
    pub async fn step(&mut self) -> bool {
        let Some(event) = self.in_flight.next().await else {
            return false;
        };
        let actions = self.app.handle(event);
        self.dispatch(actions);
        true
    }

    /// Process completions until nothing is in flight, including follow-up
    /// requests issued along the way.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Run the main loop.
    ///
    /// Applies intents as they arrive while requests are in flight. Returns
    /// the app once the intent channel is closed and every request has
    /// completed.
    pub async fn run(mut self, mut intents: mpsc::UnboundedReceiver<Intent>) -> ForumApp {
        let mut accepting = true;
        loop {
            tokio::select! {
                intent = intents.recv(), if accepting => match intent {
                    Some(intent) => self.apply(intent),
                    None => accepting = false,
                },
                Some(event) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    let actions = self.app.handle(event);
                    self.dispatch(actions);
                },
                else => break,
            }
        }
        self.app
    }

    /// Number of requests in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of render requests seen so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Get a reference to the app.
    pub fn app(&self) -> &ForumApp {
        &self.app
    }

    /// Get a mutable reference to the app.
    pub fn app_mut(&mut self) -> &mut ForumApp {
        &mut self.app
    }

    /// Get a reference to the bridge.
    pub fn bridge(&self) -> &Bridge<T> {
        &self.bridge
    }
}
