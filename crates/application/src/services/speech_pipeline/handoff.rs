//! Bounded FIFO hand-off queue between the producer and consumer tasks

use domain::SampleBlock;
use thiserror::Error;
use tokio::sync::mpsc;

/// The consumer side of the queue is gone
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Hand-off queue closed")]
pub struct HandoffClosed;

/// Create a hand-off queue holding at most `capacity` blocks
///
/// A capacity of zero is treated as one.
pub fn handoff_queue(capacity: usize) -> (BlockSender, BlockReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BlockSender { tx }, BlockReceiver { rx })
}

/// Producer end; dropping it signals end-of-data
#[derive(Debug)]
pub struct BlockSender {
    tx: mpsc::Sender<SampleBlock>,
}

impl BlockSender {
    /// Enqueue a block, waiting while the queue is full
    ///
    /// # Errors
    ///
    /// Returns [`HandoffClosed`] once the consumer closed its end; the block
    /// is dropped.
    pub async fn send(&self, block: SampleBlock) -> Result<(), HandoffClosed> {
        self.tx.send(block).await.map_err(|_| HandoffClosed)
    }

    /// Whether the consumer closed its end
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end
#[derive(Debug)]
pub struct BlockReceiver {
    rx: mpsc::Receiver<SampleBlock>,
}

impl BlockReceiver {
    /// Wait for the next block; `None` once the producer is done and the
    /// queue is empty
    pub async fn recv(&mut self) -> Option<SampleBlock> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for use on a blocking thread
    pub fn blocking_recv(&mut self) -> Option<SampleBlock> {
        self.rx.blocking_recv()
    }

    /// Close the queue and drop everything still queued
    ///
    /// Pending and future sends fail with [`HandoffClosed`]. Returns the
    /// number of discarded blocks.
    pub fn close_and_discard(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}
