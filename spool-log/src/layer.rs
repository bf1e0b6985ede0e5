//! `tracing` layer that records events into a region.

use crate::format::{format_line, Level};
use chrono::Local;
use spool::Region;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Writes every event as `time L/target: message key=value...`.
///
/// Events emitted by spool itself are skipped: the writer thread logs through
/// `tracing`, and recording those lines into the region would feed back into
/// the same writer.
#[derive(Debug, Clone)]
pub struct RegionLayer {
    region: Arc<Region>,
}

impl RegionLayer {
    pub fn new(region: Arc<Region>) -> Self {
        Self { region }
    }
}

fn is_internal(target: &str) -> bool {
    ["spool", "spool_log"].iter().any(|krate| {
        target == *krate
            || target
                .strip_prefix(krate)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S: Subscriber> Layer<S> for RegionLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal(meta.target()) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format_line(
            &Local::now().naive_local(),
            Level::from(*meta.level()),
            meta.target(),
            &visitor.finish(),
        );
        // Closed region: nothing left to record into
        let _ = self.region.write(line.as_bytes());
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
