//! File logging plus a layer that mirrors warnings into the diagnostic log.

use std::path::Path;

use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "info,wavedial=debug";

/// Forwards WARN and ERROR events to the controller as formatted lines.
pub struct ForwardLayer {
    sender: mpsc::UnboundedSender<String>,
}

impl ForwardLayer {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for ForwardLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let level = event.metadata().level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        // No receiver once the controller is gone.
        let _ = self.sender.send(message);
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

/// Install the global subscriber: append to `log_path`, mirror warnings to
/// `forward`.  `RUST_LOG` overrides the default filter.
pub fn init(log_path: &Path, forward: mpsc::UnboundedSender<String>) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ForwardLayer::new(forward))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER)),
        )
        .try_init()?;
    Ok(())
}
