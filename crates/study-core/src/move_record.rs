//! Move capability consumed by the variation tree.
//!
//! The tree stores moves without interpreting them. Everything it needs
//! from a move is behind this trait, so the tree core carries no
//! dependency on any particular chess library.

/// A single validated move as produced by the rules engine.
///
/// Equality between candidate moves is decided by the [`notation`] string
/// alone. The remaining accessors feed presentation layers built on top of
/// the tree (last-move highlighting, move-list styling) and the resolved
/// position summary; the tree itself never inspects their content.
///
/// [`notation`]: MoveRecord::notation
pub trait MoveRecord {
    /// Notation for this move, including any check or mate suffix
    /// (e.g. `"Nf3"`, `"exd5"`, `"O-O"`, `"Qxf7#"`).
    fn notation(&self) -> &str;

    /// Notation-encoded position after this move has been played
    /// (e.g. a FEN string).
    fn position_after(&self) -> &str;

    /// Origin and destination squares, when the engine reports them.
    fn endpoints(&self) -> Option<(&str, &str)>;

    /// Whether this move captures a piece.
    fn is_capture(&self) -> bool;

    /// Whether this move promotes a pawn.
    fn is_promotion(&self) -> bool;

    /// Whether this move castles on the king's side.
    fn is_kingside_castle(&self) -> bool;

    /// Whether this move castles on the queen's side.
    fn is_queenside_castle(&self) -> bool;
}
