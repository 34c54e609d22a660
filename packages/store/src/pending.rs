//! Bridge between the async request path and blocking callers.
//!
//! Every request is spawned onto the store's runtime as soon as it is
//! issued. The caller gets a [`Pending`] handle which can be awaited, or
//! blocked on with [`Pending::wait`]. Both yield the same value.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::reply::Reply;

/// A request in flight.
#[must_use = "the request runs regardless; drop the handle to ignore its outcome"]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
    on_cancel: fn() -> T,
}

/// A store request resolving to a [`Reply`].
pub type PendingReply = Pending<Reply>;

impl<T> Pending<T> {
    pub(crate) fn new(rx: oneshot::Receiver<T>, on_cancel: fn() -> T) -> Self {
        Self { rx, on_cancel }
    }

    /// Block the current thread until the request resolves.
    ///
    /// There is no deadline. Must not be called from within an async
    /// context (tokio panics if it is); use `.await` there, or move the call
    /// into `tokio::task::spawn_blocking`.
    pub fn wait(self) -> T {
        let on_cancel = self.on_cancel;
        self.rx.blocking_recv().unwrap_or_else(|_| on_cancel())
    }

    /// The outcome if the request has already resolved.
    pub fn try_take(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some((self.on_cancel)()),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let on_cancel = self.on_cancel;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| on_cancel()))
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

pub(crate) fn cancelled_reply() -> Reply {
    Reply::Failure("request cancelled: runtime shut down".to_string())
}

pub(crate) fn cancelled_ping() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wait_returns_sent_value() {
        let (tx, rx) = oneshot::channel();
        let pending = PendingReply::new(rx, cancelled_reply);

        std::thread::spawn(move || {
            tx.send(Reply::Value(json!(1))).unwrap();
        });

        assert_eq!(pending.wait(), Reply::Value(json!(1)));
    }

    #[test]
    fn dropped_sender_resolves_cancelled() {
        let (tx, rx) = oneshot::channel::<Reply>();
        drop(tx);
        let reply = PendingReply::new(rx, cancelled_reply).wait();
        assert_eq!(reply, cancelled_reply());
    }

    #[test]
    fn try_take_before_and_after() {
        let (tx, rx) = oneshot::channel();
        let mut pending = Pending::new(rx, cancelled_ping);

        assert_eq!(pending.try_take(), None);
        tx.send(true).unwrap();
        assert_eq!(pending.try_take(), Some(true));
    }

    #[tokio::test]
    async fn await_matches_wait() {
        let (tx, rx) = oneshot::channel();
        let pending = PendingReply::new(rx, cancelled_reply);
        tx.send(Reply::NotFound).unwrap();

        assert_eq!(pending.await, Reply::NotFound);
    }
}
