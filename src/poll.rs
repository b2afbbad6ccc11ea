//! Background chat polling.
//!
//! The [`Poller`] owns the sync cursor ([`PollState`]) and drives a
//! [`ChatTransport`] on a fixed refresh interval while the chat view is
//! active.  Requests and timers run as tasks on a tokio runtime; each one
//! reports back as a [`PollEvent`] over an mpsc channel.  The UI thread
//! drains that channel and feeds every event to [`Poller::handle`], so all
//! state changes and sink calls happen on that one thread.
//!
//! ## Scheduling
//!
//! ```text
//! activate() ──► fetch ──► PollEvent::Fetched ──► sleep(interval) ──► PollEvent::TimerFired ──► fetch ...
//! ```
//!
//! The next fetch is only ever scheduled from the completion of the previous
//! one, so there is never more than one fetch chain.  `deactivate()` does not
//! cancel anything; it just stops the chain at the next completion or timer.
//! `activate()` starts a new epoch: the pending timer is aborted, and a fetch
//! issued in an older epoch neither delivers messages nor re-arms the timer
//! when it comes back.  Its failure is still reported as a notice.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::{ChatBatch, ChatError, ChatTransport, Message, FROM_BEGINNING};

/// How often the chat is refreshed while the view is active.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Completions sent from runtime tasks back to the UI thread.
#[derive(Debug)]
pub enum PollEvent {
    /// A fetch issued during `epoch` finished.
    Fetched {
        epoch: u64,
        result: Result<ChatBatch, ChatError>,
    },
    /// A post finished.
    Posted(Result<Message, ChatError>),
    /// The refresh timer armed during `epoch` went off.
    TimerFired { epoch: u64 },
}

/// A user-visible failure.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Notice {
    /// The server could not be reached or answered garbage.
    Network,
    /// The server rejected the request with this reason.
    Request(String),
}

impl From<&ChatError> for Notice {
    fn from(err: &ChatError) -> Self {
        match err {
            ChatError::Transport(_) => Notice::Network,
            ChatError::Application(e) => Notice::Request(e.message.clone()),
        }
    }
}

/// Where the poller delivers what it learns.
pub trait ChatSink {
    /// New lines to show, in server order.  Never called with an empty slice.
    fn on_messages_appended(&mut self, messages: &[Message]);

    /// A request failed.  Called once per failure.
    fn on_notice(&mut self, notice: Notice);
}

/// Client-side sync cursor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PollState {
    /// Newest sequence number seen so far; never decreases.
    pub last_seq: i64,
    /// Set once the first fetch of the session has succeeded.
    pub initialized: bool,
}

impl PollState {
    pub fn new() -> Self {
        Self {
            last_seq: FROM_BEGINNING,
            initialized: false,
        }
    }

    /// Apply a successful fetch and return the messages worth showing.
    ///
    /// The very first batch is shown whole so the history renders.  After
    /// that, lines written by `own_nick` are dropped: they were already shown
    /// when the post came back.
    pub fn absorb(&mut self, own_nick: &str, batch: ChatBatch) -> Vec<Message> {
        let first = !self.initialized;
        let shown = batch
            .messages
            .into_iter()
            .filter(|m| first || m.nick != own_nick)
            .collect();

        if batch.last_seq < self.last_seq {
            warn!(
                current = self.last_seq,
                received = batch.last_seq,
                "server cursor went backwards; keeping current"
            );
        }
        self.last_seq = self.last_seq.max(batch.last_seq);
        self.initialized = true;
        shown
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

/// The polling loop.
pub struct Poller {
    transport: Arc<dyn ChatTransport>,
    nick: String,
    interval: Duration,
    runtime: Handle,
    tx: mpsc::UnboundedSender<PollEvent>,
    state: PollState,
    active: bool,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl Poller {
    /// Create an inactive poller.
    ///
    /// Returns the receiver the UI thread must drain and pass to
    /// [`handle`](Self::handle).  Tasks are spawned on `runtime`.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        nick: impl Into<String>,
        interval: Duration,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            transport,
            nick: nick.into(),
            interval,
            runtime,
            tx,
            state: PollState::new(),
            active: false,
            epoch: 0,
            timer: None,
        };
        (poller, rx)
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Enter the active state and fetch right away.
    pub fn activate(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.active = true;
        info!(epoch = self.epoch, last_seq = self.state.last_seq, "polling active");
        self.fetch_now();
    }

    /// Stop scheduling further fetches.  In-flight requests still complete.
    pub fn deactivate(&mut self) {
        if self.active {
            info!(epoch = self.epoch, "polling paused");
        }
        self.active = false;
    }

    /// Post `text` as the local user.
    ///
    /// Leading and trailing whitespace is trimmed; blank text is ignored.
    /// Returns whether a post was issued.
    pub fn submit(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let nick = self.nick.clone();
        let text = text.to_owned();
        debug!(nick = %nick, "posting message");
        self.runtime.spawn(async move {
            let result = transport.post_message(&nick, &text).await;
            // The receiver only goes away when the UI has shut down.
            let _ = tx.send(PollEvent::Posted(result));
        });
        true
    }

    /// Apply one completion event.
    pub fn handle(&mut self, event: PollEvent, sink: &mut impl ChatSink) {
        match event {
            PollEvent::Fetched { epoch, result } => self.on_fetched(epoch, result, sink),
            PollEvent::Posted(result) => match result {
                Ok(message) => sink.on_messages_appended(std::slice::from_ref(&message)),
                Err(e) => {
                    warn!(error = %e, "post failed");
                    sink.on_notice(Notice::from(&e));
                }
            },
            PollEvent::TimerFired { epoch } => {
                if epoch != self.epoch {
                    debug!(epoch, "ignoring timer from an earlier activation");
                    return;
                }
                self.timer = None;
                if self.active {
                    self.fetch_now();
                } else {
                    debug!("timer fired while paused; skipping fetch");
                }
            }
        }
    }

    fn on_fetched(
        &mut self,
        epoch: u64,
        result: Result<ChatBatch, ChatError>,
        sink: &mut impl ChatSink,
    ) {
        // A newer activation already refetched from the same cursor: drop the
        // batch and leave scheduling to that chain, but still report failures.
        if epoch != self.epoch {
            match result {
                Ok(_) => {
                    debug!(epoch, current = self.epoch, "discarding fetch from an earlier activation");
                }
                Err(e) => {
                    warn!(error = %e, epoch, "fetch from an earlier activation failed");
                    sink.on_notice(Notice::from(&e));
                }
            }
            return;
        }

        match result {
            Ok(batch) => {
                let shown = self.state.absorb(&self.nick, batch);
                debug!(shown = shown.len(), last_seq = self.state.last_seq, "fetch applied");
                if !shown.is_empty() {
                    sink.on_messages_appended(&shown);
                }
            }
            Err(e) => {
                warn!(error = %e, last_seq = self.state.last_seq, "fetch failed");
                sink.on_notice(Notice::from(&e));
            }
        }

        self.schedule_refresh();
    }

    fn fetch_now(&self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let seq = self.state.last_seq;
        debug!(epoch, seq, "fetching");
        self.runtime.spawn(async move {
            let result = transport.fetch_since(seq).await;
            let _ = tx.send(PollEvent::Fetched { epoch, result });
        });
    }

    fn schedule_refresh(&mut self) {
        if !self.active {
            return;
        }
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let interval = self.interval;
        self.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = tx.send(PollEvent::TimerFired { epoch });
        }));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
