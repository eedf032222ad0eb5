//! Capability interface onto the external chess rules engine.

use std::error::Error;

use crate::move_record::MoveRecord;

/// The rules-engine collaborator the tree relies on for notation handling.
///
/// Legal-move generation, notation parsing and position computation all
/// live behind this trait; the tree consumes the [`MoveRecord`]s an
/// implementation produces and performs no validation of its own.
pub trait RulesEngine {
    /// Move representation produced by this engine.
    type Move: MoveRecord;

    /// Error reported for malformed game records.
    type Error: Error;

    /// Parses a complete game record and applies it move by move,
    /// returning the move sequence in game order.
    ///
    /// # Errors
    ///
    /// Fails on malformed notation. A failed parse must leave no state
    /// visible to later calls, so the caller can keep its previous tree
    /// untouched.
    fn parse_and_apply(&mut self, record: &str) -> Result<Vec<Self::Move>, Self::Error>;

    /// Returns the notation-encoded starting position of the most
    /// recently parsed record, or the engine's default starting position
    /// if nothing has been parsed yet.
    fn start_position(&self) -> String;
}
