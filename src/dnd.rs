//! Drag-and-drop transfers
//!
//! Browser drag events reduced to four capabilities: begin a transfer of a
//! reservation, ask whether a target accepts it, complete it on a target,
//! or cancel. A completed transfer becomes a [`Transfer`] that the seating
//! view turns into a move request, so the assignment logic runs without a
//! browser.

/// Where a reservation card can be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Tile of a stand
    Stand(i64),
    /// The "unassigned" bucket
    Unassigned,
}

impl DropTarget {
    /// Stand id the drop maps to; `None` for the unassigned bucket
    pub fn stand_id(&self) -> Option<i64> {
        match self {
            DropTarget::Stand(id) => Some(*id),
            DropTarget::Unassigned => None,
        }
    }
}

/// A finished drag: this reservation was dropped on that target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub reservation_id: i64,
    pub target: DropTarget,
}

/// Capability interface a drag surface implements
pub trait TransferSurface {
    /// Start dragging a reservation. Replaces any transfer in progress.
    fn begin_transfer(&mut self, reservation_id: i64);

    /// Whether a drop on `target` would be accepted right now
    fn accepts(&self, target: DropTarget) -> bool;

    /// Drop on `target`. Returns the finished transfer, or `None` when
    /// nothing was being dragged.
    fn complete_transfer(&mut self, target: DropTarget) -> Option<Transfer>;

    /// Abandon the transfer in progress
    fn cancel_transfer(&mut self);
}

/// In-memory drag surface
///
/// Tracks the reservation being dragged and the target currently hovered,
/// the same state a browser keeps in its `DataTransfer`.
#[derive(Debug, Default)]
pub struct DragSession {
    dragging: Option<i64>,
    hover: Option<DropTarget>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<i64> {
        self.dragging
    }

    /// Target the card is currently over
    pub fn hover(&self) -> Option<DropTarget> {
        self.hover
    }

    /// Pointer entered a target (dragover)
    pub fn enter(&mut self, target: DropTarget) {
        if self.dragging.is_some() {
            self.hover = Some(target);
        }
    }

    /// Pointer left the target it was over (dragleave)
    pub fn leave(&mut self, target: DropTarget) {
        if self.hover == Some(target) {
            self.hover = None;
        }
    }
}

impl TransferSurface for DragSession {
    fn begin_transfer(&mut self, reservation_id: i64) {
        tracing::trace!(reservation_id, "Drag started");
        self.dragging = Some(reservation_id);
        self.hover = None;
    }

    fn accepts(&self, _target: DropTarget) -> bool {
        self.dragging.is_some()
    }

    fn complete_transfer(&mut self, target: DropTarget) -> Option<Transfer> {
        let reservation_id = self.dragging.take()?;
        self.hover = None;
        tracing::trace!(reservation_id, ?target, "Drag completed");
        Some(Transfer {
            reservation_id,
            target,
        })
    }

    fn cancel_transfer(&mut self) {
        self.dragging = None;
        self.hover = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_yields_transfer_once() {
        let mut session = DragSession::new();
        assert!(!session.accepts(DropTarget::Stand(1)));

        session.begin_transfer(42);
        session.enter(DropTarget::Stand(3));
        assert_eq!(session.hover(), Some(DropTarget::Stand(3)));
        assert!(session.accepts(DropTarget::Stand(3)));

        let transfer = session.complete_transfer(DropTarget::Stand(3)).unwrap();
        assert_eq!(transfer.reservation_id, 42);
        assert_eq!(transfer.target.stand_id(), Some(3));

        assert!(session.complete_transfer(DropTarget::Stand(3)).is_none());
        assert_eq!(session.hover(), None);
    }

    #[test]
    fn test_cancel_drops_transfer() {
        let mut session = DragSession::new();
        session.begin_transfer(7);
        session.cancel_transfer();
        assert_eq!(session.dragging(), None);
        assert!(session.complete_transfer(DropTarget::Unassigned).is_none());
    }

    #[test]
    fn test_hover_ignored_without_drag() {
        let mut session = DragSession::new();
        session.enter(DropTarget::Unassigned);
        assert_eq!(session.hover(), None);

        session.begin_transfer(1);
        session.enter(DropTarget::Unassigned);
        session.leave(DropTarget::Stand(2));
        assert_eq!(session.hover(), Some(DropTarget::Unassigned));
        session.leave(DropTarget::Unassigned);
        assert_eq!(session.hover(), None);
    }
}
