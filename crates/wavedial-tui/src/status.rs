//! Player status output → `StatusEvent`.
//!
//! The player announces stream metadata and volume changes as plain text:
//!
//! ```text
//! ICY Info: StreamTitle='Song A - Artist B';StreamUrl='';
//! Volume: 42 %
//! ```
//!
//! `drain_output` is the long-lived reader task: it takes each new process's
//! stdout from the hand-off channel, classifies every line, and reports
//! `StreamEnded` when that process's output closes.

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::handoff::{OutputStream, PipeReceiver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    TitleChanged(String),
    VolumeChanged(u16),
    RawLine(String),
    /// The current process's output closed; carries the reason (`EOF` or the
    /// read error).
    StreamEnded(String),
}

pub struct StatusParser {
    title: Regex,
    volume: Regex,
}

impl StatusParser {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            title: Regex::new(r"ICY Info: StreamTitle='(.*?)';")?,
            volume: Regex::new(r"Volume: (\d+)")?,
        })
    }

    /// Classify one line of player output.  Blank lines yield nothing.
    pub fn classify(&self, line: &str) -> Option<StatusEvent> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(caps) = self.title.captures(line) {
            return Some(StatusEvent::TitleChanged(caps[1].to_string()));
        }
        if let Some(caps) = self.volume.captures(line) {
            let percent = caps[1].parse().unwrap_or(0);
            return Some(StatusEvent::VolumeChanged(percent));
        }
        if line.trim().is_empty() {
            return None;
        }
        Some(StatusEvent::RawLine(line.to_string()))
    }
}

/// Reader task body.  Runs until the driver drops its end of the hand-off
/// channel or nobody listens for events any more.
pub async fn drain_output(
    mut pipes: PipeReceiver,
    parser: StatusParser,
    events: mpsc::UnboundedSender<StatusEvent>,
) {
    while let Some(stream) = pipes.recv().await {
        debug!("status: reading new player output");
        let Some(reason) = read_stream(stream, &parser, &events).await else {
            debug!("status: event receiver gone, stopping");
            return;
        };
        debug!("status: player output closed: {}", reason);
        if events.send(StatusEvent::StreamEnded(reason)).is_err() {
            return;
        }
    }
    debug!("status: hand-off channel closed");
}

/// Forward events for one stream.  Returns why the stream ended, or `None`
/// when the event receiver is gone.
async fn read_stream(
    stream: OutputStream,
    parser: &StatusParser,
    events: &mpsc::UnboundedSender<StatusEvent>,
) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return Some("EOF".to_string()),
            Ok(_) => {
                // Titles are not guaranteed to be UTF-8; status lines may be
                // redrawn in place with bare carriage returns.
                let text = String::from_utf8_lossy(&buf);
                for segment in text.split(['\r', '\n']) {
                    if let Some(event) = parser.classify(segment) {
                        events.send(event).ok()?;
                    }
                }
            }
            Err(e) => return Some(e.to_string()),
        }
    }
}
