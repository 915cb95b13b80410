//! Drag-and-drop reordering
//!
//! Gesture handling stays with the front-end; this only tracks which chapter
//! is being dragged and where it would land.

/// Reorder produced by a finished drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Index of the dragged chapter
    pub source: usize,
    /// Signed distance to the drop position
    pub offset: isize,
}

/// Drag state: idle, or dragging with an optional drop target
///
/// The target is the chapter entered last. Leaving it only clears the
/// hovered chapter, so a drop outside any chapter still lands there.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    source: Option<usize>,
    target: Option<usize>,
    hovered: Option<usize>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging the chapter at `index`
    pub fn begin(&mut self, index: usize) {
        self.source = Some(index);
        self.target = None;
        self.hovered = None;
    }

    /// Pointer entered the chapter at `index`
    pub fn enter(&mut self, index: usize) {
        if self.source.is_some() {
            self.target = Some(index);
            self.hovered = Some(index);
        }
    }

    /// Pointer left the hovered chapter
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    /// Chapter currently under the pointer
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Finish the drag
    ///
    /// Yields a move only when a target other than the source was entered.
    pub fn end(&mut self) -> Option<MoveRequest> {
        self.hovered = None;
        let source = self.source.take()?;
        let target = self.target.take()?;
        if source == target {
            return None;
        }

        Some(MoveRequest {
            source,
            offset: target as isize - source as isize,
        })
    }

    /// Abort the drag without moving anything
    pub fn cancel(&mut self) {
        self.source = None;
        self.target = None;
        self.hovered = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.source.is_some()
    }
}
