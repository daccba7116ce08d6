//! Rendezvous hand-off of player output streams.
//!
//! Every process the driver starts publishes its stdout here exactly once.
//! `publish` only returns after the single consumer has taken the stream, so
//! the consumer sees every process in start order and none is skipped.
//!
//! ```text
//!   driver.play()  ── Offer { stream, accepted } ──►  reader task
//!        ▲                                               │
//!        └──────────────── accepted (oneshot) ◄──────────┘
//! ```

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};

/// Output side of one player process.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

struct Offer {
    stream: OutputStream,
    accepted: oneshot::Sender<()>,
}

#[derive(Debug, thiserror::Error)]
#[error("output hand-off receiver is gone")]
pub struct HandoffClosed;

pub fn channel() -> (PipeSender, PipeReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (PipeSender { tx }, PipeReceiver { rx })
}

pub struct PipeSender {
    tx: mpsc::Sender<Offer>,
}

impl PipeSender {
    /// Hand `stream` to the consumer and wait until it has been taken.
    ///
    /// Must not be awaited from the consumer's own task.
    pub async fn publish(&self, stream: OutputStream) -> Result<(), HandoffClosed> {
        let (accepted, taken) = oneshot::channel();
        self.tx
            .send(Offer { stream, accepted })
            .await
            .map_err(|_| HandoffClosed)?;
        taken.await.map_err(|_| HandoffClosed)
    }
}

pub struct PipeReceiver {
    rx: mpsc::Receiver<Offer>,
}

impl PipeReceiver {
    /// Wait for the next process's output.  `None` once the driver is gone.
    pub async fn recv(&mut self) -> Option<OutputStream> {
        let offer = self.rx.recv().await?;
        let _ = offer.accepted.send(());
        Some(offer.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn stream(text: &str) -> OutputStream {
        Box::new(Cursor::new(text.as_bytes().to_vec()))
    }

    async fn read_all(mut s: OutputStream) -> String {
        let mut out = String::new();
        s.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_publish_waits_for_consumer() {
        let (tx, mut rx) = channel();
        let publisher = tokio::spawn(async move { tx.publish(stream("one")).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!publisher.is_finished(), "publish returned before the stream was taken");

        let got = rx.recv().await.unwrap();
        assert!(publisher.await.unwrap().is_ok());
        assert_eq!(read_all(got).await, "one");
    }

    #[tokio::test]
    async fn test_streams_arrive_in_publish_order() {
        let (tx, mut rx) = channel();
        let publisher = tokio::spawn(async move {
            for text in ["first", "second", "third"] {
                tx.publish(stream(text)).await.unwrap();
            }
        });

        let mut seen = Vec::new();
        while let Some(s) = rx.recv().await {
            seen.push(read_all(s).await);
        }
        publisher.await.unwrap();
        assert_eq!(seen, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_publish_fails_without_consumer() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(tx.publish(stream("lost")).await.is_err());
    }
}
