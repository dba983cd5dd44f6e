//! Ordered handoff queue between the output reader and `command`.
//!
//! The queue is an unbounded [`tokio::sync::mpsc`] channel, so the reader
//! never drops a result, and FIFO, so the n-th result read from the debugger
//! is the n-th one handed to a waiting command. It carries no correlation
//! ids: arrival order is the only link between a result and the command
//! that caused it.
//!
//! The output reader owns the only [`ResultSender`]; dropping it when the
//! reader stops closes the channel. Shutdown is soft either way: items
//! already queued are still handed out by [`ResultReceiver::get`], and only
//! once the queue is empty does it fail with [`AppError::ChannelClosed`].

use tokio::sync::mpsc;

use crate::{AppError, Result};

/// Create a connected sender/receiver pair.
#[must_use]
pub fn result_channel<T>() -> (ResultSender<T>, ResultReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Producing half, held by the output reader.
#[derive(Debug)]
pub struct ResultSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for ResultSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> ResultSender<T> {
    /// Enqueue `item` behind everything already queued.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelClosed`] once the receiver is shut down or
    /// dropped.
    pub fn put(&self, item: T) -> Result<()> {
        self.tx.send(item).map_err(|_| AppError::ChannelClosed)
    }

    /// Whether the receiving side no longer accepts items.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming half, held by the session.
#[derive(Debug)]
pub struct ResultReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> ResultReceiver<T> {
    /// Take the oldest item, waiting until one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelClosed`] once the channel is closed and
    /// every queued item has been taken.
    pub async fn get(&mut self) -> Result<T> {
        self.rx.recv().await.ok_or(AppError::ChannelClosed)
    }

    /// Refuse further `put`s. Queued items stay available.
    ///
    /// Calling it more than once has no further effect.
    pub fn shutdown(&mut self) {
        self.rx.close();
    }

    /// Remove and return everything queued right now, without waiting.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }

    /// Wait until the channel is closed and return whatever was still
    /// queued, in order. Nothing is left behind when it returns.
    ///
    /// Waits for every sender to be dropped unless
    /// [`shutdown`](Self::shutdown) was called first.
    pub async fn join(&mut self) -> Vec<T> {
        let mut stranded = Vec::new();
        while let Some(item) = self.rx.recv().await {
            stranded.push(item);
        }
        stranded
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Whether no more items can arrive: shut down, or every sender dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}
