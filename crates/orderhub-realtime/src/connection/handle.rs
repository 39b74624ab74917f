//! Individual WebSocket connection handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ticket::Principal;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Liveness of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Registered, socket not yet pumping.
    Connecting = 0,
    /// Accepting outbound frames.
    Open = 1,
    /// Close requested; frames are dropped.
    Closing = 2,
    /// Socket gone.
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender side of the outbound queue. The socket task owns the
/// receiver and watches [`ConnectionHandle::closed`] to know when to hang up.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Admin who owns this connection
    pub principal: Principal,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Arc<str>>,
    state: AtomicU8,
    shutdown: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle in the `Connecting` state
    pub fn new(principal: Principal, sender: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal,
            connected_at: Utc::now(),
            sender,
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Mark the socket as pumping.
    pub fn mark_open(&self) {
        let _ = self.state.compare_exchange(
            ConnectionState::Connecting as u8,
            ConnectionState::Open as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Check if connection accepts frames
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queue a frame without waiting.
    ///
    /// Returns `false` when the frame was dropped: connection not open,
    /// buffer full or receiver gone. Never blocks, never errors.
    pub fn send(&self, frame: Arc<str>) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn_id = %self.id, "Receiver gone, marking closed");
                self.state
                    .store(ConnectionState::Closed as u8, Ordering::SeqCst);
                false
            }
        }
    }

    /// Ask the socket task to close the connection.
    pub fn close(&self) {
        let _ = self.state.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
            (s < ConnectionState::Closing as u8).then_some(ConnectionState::Closing as u8)
        });
        self.shutdown.cancel();
    }

    /// Mark the socket as gone.
    pub fn mark_closed(&self) {
        self.state
            .store(ConnectionState::Closed as u8, Ordering::SeqCst);
        self.shutdown.cancel();
    }

    /// Resolves once [`close`](Self::close) or [`mark_closed`](Self::mark_closed) is called.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(buffer: usize) -> (ConnectionHandle, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer);
        (ConnectionHandle::new(Principal::new(1, "admin"), tx), rx)
    }

    #[tokio::test]
    async fn test_frames_dropped_until_open() {
        let (conn, mut rx) = handle(4);
        assert!(!conn.send("early".into()));
        conn.mark_open();
        assert!(conn.send("hello".into()));
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let (conn, _rx) = handle(1);
        conn.mark_open();
        assert!(conn.send("a".into()));
        assert!(!conn.send("b".into()));
        assert!(conn.is_open());
    }

    #[tokio::test]
    async fn test_dropped_receiver_marks_closed() {
        let (conn, rx) = handle(1);
        conn.mark_open();
        drop(rx);
        assert!(!conn.send("a".into()));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_signals_socket_task() {
        let (conn, _rx) = handle(1);
        conn.mark_open();
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closing);
        conn.closed().await;
        assert!(!conn.send("late".into()));
    }
}
