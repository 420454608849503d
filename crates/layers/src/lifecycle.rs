/// Lifecycle of one overlay on the render surface.
///
/// Absent → Materializing → Materialized → Removing → Absent
///
/// A failed materialization falls back from `Materializing` to `Absent`; a
/// failed layer removal falls back from `Removing` to `Materialized`.
/// Transitions happen only inside reconciler passes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverlayState {
    Absent,
    Materializing,
    Materialized,
    Removing,
}

impl OverlayState {
    pub fn can_transition_to(self, next: OverlayState) -> bool {
        use OverlayState::*;
        matches!(
            (self, next),
            (Absent, Materializing)
                | (Materializing, Materialized)
                | (Materializing, Absent)
                | (Materialized, Removing)
                | (Removing, Absent)
                | (Removing, Materialized)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            OverlayState::Absent => "absent",
            OverlayState::Materializing => "materializing",
            OverlayState::Materialized => "materialized",
            OverlayState::Removing => "removing",
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        OverlayState::Absent
    }
}
