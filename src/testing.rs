//! Shared helpers for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Subscriber remembering every event it receives.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    /// Builds a recorder and a set delivering to it.
    pub(crate) fn set() -> (Arc<Recorder>, Arc<SubscriberSet>) {
        let rec = Arc::new(Recorder::default());
        let subs = Arc::new(SubscriberSet::new(vec![rec.clone() as Arc<dyn Subscribe>]));
        (rec, subs)
    }

    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    /// Terminal outcome recorded for the hook tagged `tag`.
    pub(crate) fn outcome(&self, tag: &str) -> Option<EventKind> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_hook_outcome() && e.name.as_deref() == Some(tag))
            .map(|e| e.kind)
            .last()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
