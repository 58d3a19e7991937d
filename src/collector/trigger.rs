//! Visibility triggers that drive a collector
//!
//! The collector only needs to know when the end of its list became visible.
//! Where that signal comes from (a viewport observer, a "load more" button,
//! a server-side page budget) is an adapter implementing [`VisibilityTrigger`].

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Signals that the load-more sentinel became visible
#[async_trait]
pub trait VisibilityTrigger: Send {
    /// Wait for the next visibility signal; `false` once no more will come
    async fn visible(&mut self) -> bool;
}

/// Trigger fed by a channel, e.g. from a viewport observer
///
/// Signals that queue up while the collector is busy collapse into one.
#[derive(Debug)]
pub struct ChannelTrigger {
    rx: mpsc::Receiver<()>,
}

impl ChannelTrigger {
    /// Create a trigger and the sender an observer uses to fire it
    pub fn channel(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl VisibilityTrigger for ChannelTrigger {
    async fn visible(&mut self) -> bool {
        if self.rx.recv().await.is_none() {
            return false;
        }
        while self.rx.try_recv().is_ok() {}
        true
    }
}

/// Trigger that fires a fixed number of times, for explicit "load more" use
#[derive(Debug, Clone, Copy)]
pub struct PageBudget {
    remaining: u32,
}

impl PageBudget {
    pub fn new(pages: u32) -> Self {
        Self { remaining: pages }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[async_trait]
impl VisibilityTrigger for PageBudget {
    async fn visible(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
