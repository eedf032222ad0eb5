//! Resolved view of the current position for rendering layers.

/// Snapshot describing the position the cursor currently points at.
///
/// Recomputed on every query; renderers must not rely on identity between
/// two summaries of the same position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionSummary {
    /// Notation-encoded position at the cursor (e.g. a FEN string).
    /// The starting position when the cursor is at the pre-game sentinel.
    pub position: String,
    /// Origin and destination squares of the move that produced this
    /// position, when the engine reported them. `None` at the pre-game
    /// position.
    pub last_move: Option<(String, String)>,
    /// Variation the cursor currently points into.
    pub variation: usize,
    /// Number of plies played from game start through the cursor.
    pub ply_depth: usize,
}

/// Type alias for the change-notification callback.
///
/// Invoked after every mutating tree operation with the freshly resolved
/// summary. The tree is single-threaded, so no `Send`/`Sync` bounds.
pub type ChangeCallback = dyn Fn(PositionSummary) + 'static;
