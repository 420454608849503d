/// Holds work back until a collaborator signals readiness.
///
/// Ordering contract:
/// - Before readiness only the most recent submission is retained.
/// - `open` hands back the retained value exactly once.
/// - After readiness submissions pass straight through.
#[derive(Debug)]
pub struct ReadinessGate<T> {
    ready: bool,
    pending: Option<T>,
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self {
            ready: false,
            pending: None,
        }
    }
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Returns `Some(value)` when it may run now, otherwise parks it,
    /// replacing anything parked earlier.
    pub fn submit(&mut self, value: T) -> Option<T> {
        if self.ready {
            return Some(value);
        }
        self.pending = Some(value);
        None
    }

    /// Marks the gate ready and yields the parked value, if any.
    ///
    /// Opening an already-open gate yields nothing.
    pub fn open(&mut self) -> Option<T> {
        if self.ready {
            return None;
        }
        self.ready = true;
        self.pending.take()
    }

    /// Returns to the not-ready state. Parked work is kept.
    pub fn close(&mut self) {
        self.ready = false;
    }
}
