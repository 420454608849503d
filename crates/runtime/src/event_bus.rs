use std::collections::VecDeque;

/// One entry of the reconciliation trace.
///
/// Structured text keyed by the pass that produced it; `kind` is a short
/// static tag such as `"materialized"`, `"removing"` or `"skip"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub pass: u64,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: Option<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` events, dropping the oldest first.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: Some(capacity),
        }
    }

    pub fn emit(&mut self, pass: u64, kind: &'static str, message: impl Into<String>) {
        if let Some(cap) = self.capacity {
            if cap == 0 {
                return;
            }
            if self.events.len() >= cap {
                self.events.pop_front();
            }
        }
        self.events.push_back(Event {
            pass,
            kind,
            message: message.into(),
        });
    }

    /// Oldest first.
    pub fn events(&self) -> &VecDeque<Event> {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_with_pass_index() {
        let mut bus = EventBus::new();
        bus.emit(2, "add", "raster:a");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].pass, 2);
        assert_eq!(bus.of_kind("add").count(), 1);
        assert_eq!(bus.of_kind("remove").count(), 0);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(0, "k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn capacity_limit_drops_oldest() {
        let mut bus = EventBus::with_capacity_limit(2);
        bus.emit(0, "k", "a");
        bus.emit(1, "k", "b");
        bus.emit(2, "k", "c");
        let msgs: Vec<&str> = bus.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["b", "c"]);
    }

    #[test]
    fn full_trace_keeps_the_newest_window() {
        let mut bus = EventBus::with_capacity_limit(3);
        for pass in 0..10 {
            bus.emit(pass, "k", pass.to_string());
        }
        let passes: Vec<u64> = bus.events().iter().map(|e| e.pass).collect();
        assert_eq!(passes, vec![7, 8, 9]);
        assert_eq!(bus.drain().len(), 3);
        bus.emit(10, "k", "after drain");
        assert_eq!(bus.events().len(), 1);
    }
}
