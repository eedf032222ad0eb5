//! Variation tree storage and navigation.
//!
//! This module provides the `Tree` struct which stores a game's main line
//! plus any number of branching alternative lines, tracks a single
//! current-position cursor into that structure, and handles move
//! insertion, navigation, and bulk construction from a parsed game record.

use std::fmt;

use rand::seq::IteratorRandom;

use crate::cursor::Cursor;
use crate::move_record::MoveRecord;
use crate::rules::RulesEngine;
use crate::view::{ChangeCallback, PositionSummary};

/// Error returned when an address does not resolve to a stored node.
///
/// Carries the offending address. Raised for unknown variation indices,
/// ply indices past the end of a variation, and the pre-game sentinel
/// (a valid address with no node behind it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfRange(pub Cursor);

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no move recorded at {}", self.0)
    }
}

impl std::error::Error for OutOfRange {}

/// One ply recorded in a variation.
///
/// All references between nodes are [`Cursor`] values into the tree's
/// storage, never object links.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<M> {
    /// This node's own address; `id.ply` equals its position within the
    /// variation's sequence.
    pub id: Cursor,
    /// The move played to reach this node. Immutable once attached.
    pub mv: M,
    /// Variations recorded as alternatives to this move. These are
    /// siblings sharing this node's parent, not descendants.
    pub variations: Vec<usize>,
    /// Address of the position this move was played from. For the first
    /// node of a variation this equals the branch point's own `prev`.
    pub prev: Cursor,
}

/// Stores every recorded line of a game and the current-position cursor.
///
/// Variation 0 is the main line; further variations are allocated densely
/// as alternatives get recorded and are never removed or reused. The only
/// destructive operation is [`load_game`](Tree::load_game), which replaces
/// the whole tree with a freshly parsed main line.
///
/// The tree never interprets chess rules: every move arrives as an
/// externally validated [`MoveRecord`], and position strings are carried
/// through from the rules engine untouched.
pub struct Tree<M> {
    /// Variation index to ordered ply sequence.
    lines: Vec<Vec<Node<M>>>,
    /// Address of the position currently in view.
    cursor: Cursor,
    /// Starting position supplied by the rules engine.
    start_position: String,
    /// Invoked after every mutation with the freshly resolved summary.
    on_change: Option<Box<ChangeCallback>>,
}

impl<M: MoveRecord> Tree<M> {
    /// Creates an empty tree: one empty main line, cursor at the
    /// pre-game position.
    ///
    /// # Arguments
    ///
    /// * `start_position` - Notation-encoded starting position, as
    ///   reported by the rules engine.
    pub fn new(start_position: impl Into<String>) -> Self {
        Self {
            lines: vec![Vec::new()],
            cursor: Cursor::START,
            start_position: start_position.into(),
            on_change: None,
        }
    }

    /// Registers a callback invoked after every mutating operation.
    ///
    /// The callback receives the same summary a call to
    /// [`summary`](Tree::summary) would produce at that point. Storage and
    /// cursor writes complete before the callback runs, so an observer
    /// never sees a half-updated tree.
    pub fn on_change(mut self, callback: impl Fn(PositionSummary) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Returns the node at the given address.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if the variation index is unknown or the ply
    /// index is not within the variation's current length. The pre-game
    /// sentinel has no node, so it is also out of range here; callers
    /// special-case it via [`is_start`](Tree::is_start) or
    /// [`current`](Tree::current).
    pub fn get(&self, at: Cursor) -> Result<&Node<M>, OutOfRange> {
        if at.ply < 0 {
            return Err(OutOfRange(at));
        }
        self.lines
            .get(at.variation)
            .and_then(|line| line.get(at.ply as usize))
            .ok_or(OutOfRange(at))
    }

    /// Resolves the cursor to its node, or `None` at the pre-game
    /// position.
    pub fn current(&self) -> Option<&Node<M>> {
        self.get(self.cursor).ok()
    }

    /// Returns the current cursor address.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the starting position the tree was built from.
    pub fn start_position(&self) -> &str {
        &self.start_position
    }

    /// Returns the main line (variation 0) in full.
    pub fn main_line(&self) -> &[Node<M>] {
        &self.lines[0]
    }

    /// Returns the variation the cursor currently points into.
    pub fn active_line(&self) -> &[Node<M>] {
        &self.lines[self.cursor.variation]
    }

    /// Returns any variation by index, or `None` for unknown indices.
    pub fn line(&self, variation: usize) -> Option<&[Node<M>]> {
        self.lines.get(variation).map(Vec::as_slice)
    }

    /// Returns the number of variations recorded so far (at least 1).
    pub fn variation_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when the cursor is at the pre-game position.
    pub fn is_start(&self) -> bool {
        self.cursor.is_start()
    }

    /// Moves the cursor to the given address unconditionally.
    ///
    /// No validation is performed beyond what a later
    /// [`get`](Tree::get) would enforce; callers jumping to a node are
    /// responsible for supplying a live address.
    pub fn set_cursor(&mut self, at: Cursor) {
        self.cursor = at;
        self.notify();
    }

    /// Moves the cursor to the pre-game position, regardless of the
    /// active variation.
    pub fn first(&mut self) {
        self.cursor = Cursor::START;
        self.notify();
    }

    /// Moves the cursor to the last ply of the main line specifically,
    /// even when the cursor is inside a side variation. An empty main
    /// line yields the pre-game position.
    pub fn last(&mut self) {
        self.cursor = Cursor::new(0, self.lines[0].len() as i32 - 1);
        self.notify();
    }

    /// Moves the cursor one ply backwards, to the current node's parent
    /// position. Siblings share a parent, so this may land in a different
    /// variation than the one just left. No-op at the pre-game position.
    pub fn prev(&mut self) {
        let Some(prev) = self.current().map(|node| node.prev) else {
            return;
        };
        self.cursor = prev;
        self.notify();
    }

    /// Moves the cursor one ply forwards along the current variation.
    ///
    /// No-op when nothing further is recorded. When the node stepped onto
    /// has recorded alternatives, one of {stay on the current variation,
    /// each alternative} is chosen uniformly at random, and a switch puts
    /// the cursor on ply 0 of the chosen variation. The roll is repeated
    /// on every call, so walking forwards through a branch point may take
    /// a different line each time.
    pub fn next(&mut self) {
        let slot = self.cursor.next_ply();
        let Ok(target) = self.get(slot) else {
            return;
        };

        let alternatives = target.variations.clone();
        self.cursor = slot;

        if !alternatives.is_empty() {
            let mut rng = rand::rng();
            let choice = std::iter::once(slot.variation)
                .chain(alternatives)
                .choose(&mut rng)
                .unwrap();
            if choice != slot.variation {
                self.cursor = Cursor::new(choice, 0);
            }
        }

        self.notify();
    }

    /// Records a move played from the current position.
    ///
    /// Three outcomes, all idempotent with respect to tree shape:
    ///
    /// * nothing is recorded after the cursor - the move extends the
    ///   current variation;
    /// * the move matches the recorded continuation or one of its
    ///   alternatives (by notation) - only the cursor moves;
    /// * the move diverges - a new variation is allocated, seeded with
    ///   this move as a sibling of the recorded continuation, and
    ///   registered in that continuation's alternative list.
    ///
    /// The cursor ends on the node carrying the move in every case.
    ///
    /// # Arguments
    ///
    /// * `mv` - An externally validated move record.
    pub fn add(&mut self, mv: M) {
        let slot = self.cursor.next_ply();

        if self.get(slot).is_err() {
            // Extend the current line.
            debug_assert_eq!(
                self.lines[slot.variation].len(),
                slot.ply as usize,
                "extension must append at the end of its variation"
            );
            let prev = self.cursor;
            self.lines[slot.variation].push(Node {
                id: slot,
                mv,
                variations: Vec::new(),
                prev,
            });
            self.cursor = slot;
            self.notify();
            return;
        }

        // A continuation is already recorded. Candidates are that node
        // plus the first node of each of its alternatives.
        let (matched, branch_prev) = {
            let existing = &self.lines[slot.variation][slot.ply as usize];
            let mut found = (existing.mv.notation() == mv.notation()).then_some(existing.id);
            if found.is_none() {
                for &v in &existing.variations {
                    if let Some(first) = self.lines.get(v).and_then(|line| line.first())
                        && first.mv.notation() == mv.notation()
                    {
                        found = Some(first.id);
                        break;
                    }
                }
            }
            (found, existing.prev)
        };

        match matched {
            // The move is already recorded: replay, cursor only.
            Some(at) => self.cursor = at,
            // Divergence: fork a sibling variation. Its first node shares
            // the branched-from node's parent.
            None => {
                let fork = Cursor::new(self.lines.len(), 0);
                self.lines.push(vec![Node {
                    id: fork,
                    mv,
                    variations: Vec::new(),
                    prev: branch_prev,
                }]);
                self.lines[slot.variation][slot.ply as usize]
                    .variations
                    .push(fork.variation);
                self.cursor = fork;
            }
        }
        self.notify();
    }

    /// Replaces the whole tree with the moves of a parsed game record.
    ///
    /// The engine parses the record first; only on success are all
    /// recorded variations discarded, the parsed sequence installed as
    /// the new main line, and the cursor set to its final ply.
    /// Variation-index allocation restarts at zero.
    ///
    /// # Arguments
    ///
    /// * `engine` - The rules-engine collaborator that parses the record.
    /// * `record` - A complete game record in the engine's notation.
    ///
    /// # Errors
    ///
    /// Propagates the engine's error unchanged for malformed records, in
    /// which case the tree is left exactly as it was.
    pub fn load_game<E>(&mut self, engine: &mut E, record: &str) -> Result<(), E::Error>
    where
        E: RulesEngine<Move = M>,
    {
        let moves = engine.parse_and_apply(record)?;

        let mut line = Vec::with_capacity(moves.len());
        for (ply, mv) in moves.into_iter().enumerate() {
            line.push(Node {
                id: Cursor::new(0, ply as i32),
                mv,
                variations: Vec::new(),
                prev: Cursor::new(0, ply as i32 - 1),
            });
        }

        self.cursor = Cursor::new(0, line.len() as i32 - 1);
        self.lines = vec![line];
        self.start_position = engine.start_position();
        self.notify();
        Ok(())
    }

    /// Returns the number of plies played from game start through the
    /// given address, following `prev` links. The pre-game sentinel has
    /// depth 0.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if the address (or any address on its
    /// parent chain) does not resolve to a node.
    pub fn depth(&self, at: Cursor) -> Result<usize, OutOfRange> {
        let mut at = at;
        let mut plies = 0;
        while !at.is_start() {
            at = self.get(at)?.prev;
            plies += 1;
        }
        Ok(plies)
    }

    /// Resolves the cursor into a summary for rendering layers.
    ///
    /// Recomputed on every call, never cached.
    pub fn summary(&self) -> PositionSummary {
        let ply_depth = self.depth(self.cursor).unwrap_or(0);
        match self.current() {
            Some(node) => PositionSummary {
                position: node.mv.position_after().to_owned(),
                last_move: node
                    .mv
                    .endpoints()
                    .map(|(from, to)| (from.to_owned(), to.to_owned())),
                variation: self.cursor.variation,
                ply_depth,
            },
            None => PositionSummary {
                position: self.start_position.clone(),
                last_move: None,
                variation: self.cursor.variation,
                ply_depth,
            },
        }
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_change {
            callback(self.summary());
        }
    }
}
