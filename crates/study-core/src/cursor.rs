use std::cmp::Ordering;
use std::fmt;

/// Address of a single ply within a game's variation tree.
///
/// A cursor pairs a variation index with a 0-based ply index into that
/// variation's move sequence:
///
/// ```text
/// variation 0 (main line):  (0,-1)  (0,0)  (0,1)  (0,2) ...
/// variation 1:                      (1,0)  (1,1) ...
/// variation 2:                             (2,0) ...
/// ```
///
/// The special ply value `-1` addresses the position before any move has
/// been played. It is only meaningful on the main line (variation 0) and
/// has no stored node behind it.
///
/// Cursors are plain values: they are copied freely between nodes as
/// parent links and held by callers without implying ownership of the
/// node they name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Index of the variation this cursor points into.
    pub variation: usize,
    /// 0-based ply within the variation, or -1 for the pre-game position.
    pub ply: i32,
}

impl Cursor {
    /// The position before the first move of the main line.
    pub const START: Cursor = Cursor {
        variation: 0,
        ply: -1,
    };

    /// Creates a cursor from a variation index and a ply index.
    #[inline]
    pub const fn new(variation: usize, ply: i32) -> Cursor {
        Cursor { variation, ply }
    }

    /// Returns `true` when this cursor addresses the pre-game position.
    #[inline]
    pub fn is_start(self) -> bool {
        self == Self::START
    }

    /// Returns the address of the slot directly after this one in the
    /// same variation.
    #[inline]
    pub fn next_ply(self) -> Cursor {
        Cursor {
            variation: self.variation,
            ply: self.ply + 1,
        }
    }
}

impl PartialOrd for Cursor {
    /// Cursors in the same variation are ordered by ply; cursors in
    /// different variations are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.variation == other.variation {
            Some(self.ply.cmp(&other.ply))
        } else {
            None
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.variation, self.ply)
    }
}
