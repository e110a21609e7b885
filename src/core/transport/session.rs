//! SSE sessions and their outbound message queues.
//!
//! Every `GET /sse` opens one [`Session`]. Responses produced for that
//! session are pushed onto an unbounded FIFO queue which the SSE stream
//! drains in order. Closing a session drops its sender so the stream ends,
//! and anything enqueued afterwards is discarded.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use super::jsonrpc::JsonRpcResponse;

/// Identifier of an SSE session.
pub type SessionId = Uuid;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// A live client connection with its outbound queue.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    sender: Mutex<Option<mpsc::UnboundedSender<JsonRpcResponse>>>,
    state: AtomicU8,
}

impl Session {
    fn new(id: SessionId, sender: mpsc::UnboundedSender<JsonRpcResponse>) -> Self {
        Self {
            id,
            sender: Mutex::new(Some(sender)),
            state: AtomicU8::new(SessionState::Open as u8),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Push a message onto the session queue.
    ///
    /// Returns `false` when the session is no longer open; the message is
    /// dropped in that case.
    pub fn enqueue(&self, message: JsonRpcResponse) -> bool {
        if !self.is_open() {
            debug!(session_id = %self.id, "Dropping message for closed session");
            return false;
        }
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    fn close(&self) {
        self.state
            .store(SessionState::Closing as u8, Ordering::Release);
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.state.store(SessionState::Closed as u8, Ordering::Release);
    }
}

/// Registry of open sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session and return the stream of its queued messages.
    ///
    /// Dropping the returned subscription closes the session.
    pub fn open(self: &Arc<Self>) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id, tx));

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session);
        info!(session_id = %id, "Session opened");

        SessionSubscription {
            id,
            manager: Arc::clone(self),
            messages: UnboundedReceiverStream::new(rx),
        }
    }

    /// Look up an open session.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Close and forget a session. Returns `false` if it was not open.
    pub fn close(&self, id: &SessionId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        match removed {
            Some(session) => {
                session.close();
                info!(session_id = %id, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Close every session, ending all SSE streams.
    pub fn close_all(&self) {
        let drained: Vec<Arc<Session>> = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, session)| session)
            .collect();
        for session in &drained {
            session.close();
        }
        info!(count = drained.len(), "All sessions closed");
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving end of a session queue.
///
/// Yields messages in enqueue order and ends once the session is closed.
#[derive(Debug)]
pub struct SessionSubscription {
    id: SessionId,
    manager: Arc<SessionManager>,
    messages: UnboundedReceiverStream<JsonRpcResponse>,
}

impl SessionSubscription {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Stream for SessionSubscription {
    type Item = JsonRpcResponse;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.messages).poll_next(cx)
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.manager.close(&self.id);
    }
}
