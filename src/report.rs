//! Reporting capability passed to every engine entry point
//!
//! Components never log through a global; they receive a [Reporter] and hand
//! it [BuildEvent]s. The binary uses [TracingReporter], tests use
//! [MemoryReporter] to assert on exactly what happened.

use std::sync::Mutex;

use crate::events::BuildEvent;

/// Sink for build events
pub trait Reporter: Send + Sync {
    fn report(&self, event: BuildEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: BuildEvent) {
        if event.is_warning() {
            tracing::warn!("{}", event);
        } else {
            tracing::info!("{}", event);
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<BuildEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn events(&self) -> Vec<BuildEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drop everything reported so far
    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: BuildEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_memory_reporter_keeps_order() {
        let reporter = MemoryReporter::new();
        reporter.report(BuildEvent::IndexSorted {
            path: PathBuf::from("index.yaml"),
            modules: 1,
        });
        reporter.report(BuildEvent::IndexSorted {
            path: PathBuf::from("index-dev.yaml"),
            modules: 2,
        });

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(events[1].to_string().contains("index-dev.yaml"));

        reporter.clear();
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_tracing_reporter_without_subscriber() {
        TracingReporter.report(BuildEvent::IndexSorted {
            path: PathBuf::from("index.yaml"),
            modules: 0,
        });
    }
}
