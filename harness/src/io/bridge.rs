//! Routes `tracing` records into the intercepted console.
//!
//! The running thread gets the bridge as its scoped default subscriber.
//! Threads spawned by user code fall back to the global subscriber, which
//! carries a [`RelayLayer`] (see [`crate::logging::init`]) forwarding their
//! records to whichever console is currently capturing.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::dispatcher::DefaultGuard;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::io::interceptor::Console;

/// Console receiving records from threads other than the running one.
static RELAY: Mutex<Option<Relay>> = Mutex::new(None);

#[derive(Clone)]
struct Relay {
    console: Console,
    threshold: LevelFilter,
}

/// Keeps the bridge installed; dropping it restores the previous routing.
pub(crate) struct BridgeGuard {
    console: Console,
    _default: DefaultGuard,
}

impl Drop for BridgeGuard {
    fn drop(&mut self) {
        let mut relay = RELAY.lock().unwrap_or_else(PoisonError::into_inner);
        if relay
            .as_ref()
            .is_some_and(|active| active.console.same_buffer(&self.console))
        {
            *relay = None;
        }
    }
}

/// Install the bridge as this thread's default subscriber and register
/// `console` as the relay target for other threads.
///
/// Records from every target at or above `threshold` are captured. Other
/// threads are only captured when the global subscriber carries the relay
/// layer; otherwise their records go wherever that subscriber sends them.
pub(crate) fn install(console: Console, threshold: LevelFilter) -> BridgeGuard {
    *RELAY.lock().unwrap_or_else(PoisonError::into_inner) = Some(Relay {
        console: console.clone(),
        threshold,
    });
    let subscriber = tracing_subscriber::registry()
        .with(threshold)
        .with(BridgeLayer::new(console.clone()));
    BridgeGuard {
        console,
        _default: tracing::subscriber::set_default(subscriber),
    }
}

/// Layer that writes each record as `[SEVERITY] message` through a [`Console`].
pub struct BridgeLayer {
    console: Console,
}

impl BridgeLayer {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl<S: Subscriber> Layer<S> for BridgeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.console.print(render(event));
    }
}

/// Global-subscriber layer forwarding records to the active capture, if any.
#[derive(Debug, Default)]
pub struct RelayLayer;

impl<S: Subscriber> Layer<S> for RelayLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(relay) = RELAY.lock().unwrap_or_else(PoisonError::into_inner).clone() else {
            return;
        };
        if *event.metadata().level() <= relay.threshold {
            relay.console.print(render(event));
        }
    }
}

fn render(event: &Event<'_>) -> String {
    let mut visitor = RecordVisitor::default();
    event.record(&mut visitor);
    format!(
        "[{}] {}",
        severity_label(*event.metadata().level()),
        visitor.finish()
    )
}

/// Severity prefix used in captured lines.
pub fn severity_label(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Vec<String>,
}

impl RecordVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
