//! Chess rules backend for the variation tree.
//!
//! [`SanEngine`] wraps the `shakmaty` move generator behind the
//! [`RulesEngine`] trait: it parses whole game records into validated
//! move sequences and checks single moves typed at the prompt. The
//! tree itself never sees a chess type, only the [`SanMove`] records
//! produced here.

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, CastlingSide, Chess, EnPassantMode, File, Move, Square};

use study_core::move_record::MoveRecord;
use study_core::rules::RulesEngine;

/// Error type for record parsing and move validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// A movetext token that is not syntactically valid SAN.
    BadSan(String),
    /// A well-formed SAN token with no legal interpretation in its position.
    IllegalMove(String),
    /// An unusable FEN in the record's starting-position tag.
    BadFen(String),
    /// Structurally unreadable movetext.
    Syntax(String),
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::BadSan(token) => write!(f, "not a move: '{token}'"),
            NotationError::IllegalMove(token) => {
                write!(f, "illegal move in this position: '{token}'")
            }
            NotationError::BadFen(fen) => write!(f, "invalid FEN: '{fen}'"),
            NotationError::Syntax(what) => write!(f, "unreadable movetext: {what}"),
        }
    }
}

impl std::error::Error for NotationError {}

/// A validated move carrying the presentation data the tree and the
/// display consume: canonical SAN, the position after the move as FEN,
/// board endpoints, and the move-class flags.
#[derive(Clone, Debug)]
pub struct SanMove {
    san: String,
    after: String,
    from: String,
    to: String,
    capture: bool,
    promotion: bool,
    castle: Option<CastlingSide>,
}

impl MoveRecord for SanMove {
    fn notation(&self) -> &str {
        &self.san
    }

    fn position_after(&self) -> &str {
        &self.after
    }

    fn endpoints(&self) -> Option<(&str, &str)> {
        Some((&self.from, &self.to))
    }

    fn is_capture(&self) -> bool {
        self.capture
    }

    fn is_promotion(&self) -> bool {
        self.promotion
    }

    fn is_kingside_castle(&self) -> bool {
        self.castle == Some(CastlingSide::KingSide)
    }

    fn is_queenside_castle(&self) -> bool {
        self.castle == Some(CastlingSide::QueenSide)
    }
}

/// Standard-chess rules engine.
///
/// Remembers the starting position of the last record it parsed, so a
/// tree rebuilt from a `[FEN]`-tagged record reports the right root.
pub struct SanEngine {
    start_fen: String,
}

impl SanEngine {
    pub fn new() -> Self {
        Self {
            start_fen: Fen::from_position(Chess::default(), EnPassantMode::Legal).to_string(),
        }
    }

    /// Validates a single SAN token against a position given as FEN.
    ///
    /// # Returns
    /// The move record, with the SAN canonicalized (disambiguation and
    /// check suffix recomputed from the position).
    pub fn validate(&self, position: &str, san: &str) -> Result<SanMove, NotationError> {
        let mut pos = position_from_fen(position)?;
        play_san(&mut pos, san.trim())
    }
}

impl Default for SanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine for SanEngine {
    type Move = SanMove;
    type Error = NotationError;

    fn parse_and_apply(&mut self, record: &str) -> Result<Vec<SanMove>, NotationError> {
        let (start_tag, movetext) = split_tags(record);
        let mut pos = match &start_tag {
            Some(fen) => position_from_fen(fen)?,
            None => Chess::default(),
        };
        let start_fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();

        let mut moves = Vec::new();
        for token in movetext_tokens(&movetext)? {
            moves.push(play_san(&mut pos, &token)?);
        }

        self.start_fen = start_fen;
        Ok(moves)
    }

    fn start_position(&self) -> String {
        self.start_fen.clone()
    }
}

/// Splits a record into its `[FEN]` tag value, if any, and the movetext.
///
/// Tag pair lines other than `[FEN]` are dropped, as are `%` escape
/// lines.
fn split_tags(record: &str) -> (Option<String>, String) {
    let mut fen = None;
    let mut movetext = String::new();
    for line in record.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('[') {
            if let Some(value) = rest
                .strip_prefix("FEN")
                .and_then(|r| r.trim_start().strip_prefix('"'))
                && let Some(end) = value.find('"')
            {
                fen = Some(value[..end].to_string());
            }
            continue;
        }
        movetext.push_str(line);
        movetext.push('\n');
    }
    (fen, movetext)
}

/// Reduces the movetext to bare SAN tokens.
///
/// Brace and line comments are dropped, parenthesized variations are
/// skipped whole, and move numbers, NAGs, annotation suffixes and the
/// result marker are filtered out.
fn movetext_tokens(movetext: &str) -> Result<Vec<String>, NotationError> {
    let mut cleaned = String::new();
    let mut in_brace = false;
    let mut in_line_comment = false;
    let mut depth = 0usize;

    for c in movetext.chars() {
        if in_brace {
            if c == '}' {
                in_brace = false;
            }
            continue;
        }
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                cleaned.push('\n');
            }
            continue;
        }
        match c {
            '{' => in_brace = true,
            ';' => in_line_comment = true,
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(NotationError::Syntax("unmatched ')'".to_string()));
                }
                depth -= 1;
            }
            _ if depth > 0 => {}
            _ => cleaned.push(c),
        }
    }
    if in_brace {
        return Err(NotationError::Syntax("unterminated comment".to_string()));
    }
    if depth > 0 {
        return Err(NotationError::Syntax("unterminated variation".to_string()));
    }

    Ok(cleaned
        .split_whitespace()
        .filter_map(normalize_token)
        .collect())
}

/// Turns one whitespace-separated movetext item into a SAN token, or
/// `None` for move numbers, NAGs and result markers. Handles glued
/// forms like `12.e4` and `12...c5`, and the `0-0` castling spelling.
fn normalize_token(raw: &str) -> Option<String> {
    if matches!(raw, "1-0" | "0-1" | "1/2-1/2" | "*") || raw.starts_with('$') {
        return None;
    }

    let mut token = raw;
    if token.starts_with(|c: char| c.is_ascii_digit()) && !token.starts_with("0-0") {
        let digits = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        let rest = &token[digits..];
        if rest.is_empty() {
            return None;
        }
        if rest.starts_with('.') {
            token = rest.trim_start_matches('.');
            if token.is_empty() {
                return None;
            }
        }
    }

    let token = token.trim_end_matches(['!', '?']);
    if token.is_empty() {
        return None;
    }

    if let Some(suffix) = token.strip_prefix("0-0-0") {
        return Some(format!("O-O-O{suffix}"));
    }
    if let Some(suffix) = token.strip_prefix("0-0") {
        return Some(format!("O-O{suffix}"));
    }
    Some(token.to_string())
}

fn position_from_fen(fen: &str) -> Result<Chess, NotationError> {
    let trimmed = fen.trim();
    let parsed: Fen = trimmed
        .parse()
        .map_err(|_| NotationError::BadFen(trimmed.to_string()))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| NotationError::BadFen(trimmed.to_string()))
}

/// Applies one SAN token to `pos` and builds its move record.
fn play_san(pos: &mut Chess, token: &str) -> Result<SanMove, NotationError> {
    let san_plus: SanPlus = token
        .parse()
        .map_err(|_| NotationError::BadSan(token.to_string()))?;
    let m = san_plus
        .san
        .to_move(pos)
        .map_err(|_| NotationError::IllegalMove(token.to_string()))?;

    let (from, to) = endpoints_of(&m);
    let capture = m.is_capture();
    let promotion = m.is_promotion();
    let castle = castle_side(&m);

    let canonical = SanPlus::from_move_and_play_unchecked(pos, &m);
    let after = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();

    Ok(SanMove {
        san: canonical.to_string(),
        after,
        from: from.to_string(),
        to: to.to_string(),
        capture,
        promotion,
        castle,
    })
}

/// Board endpoints of a move. Castling reports the king's travel, not
/// the king-takes-rook encoding shakmaty uses internally.
fn endpoints_of(m: &Move) -> (Square, Square) {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() < king.file() {
                File::C
            } else {
                File::G
            };
            (king, Square::from_coords(file, king.rank()))
        }
        Move::Normal { from, to, .. } => (from, to),
        Move::EnPassant { from, to } => (from, to),
        Move::Put { to, .. } => (to, to),
    }
}

fn castle_side(m: &Move) -> Option<CastlingSide> {
    match *m {
        Move::Castle { king, rook } if rook.file() < king.file() => Some(CastlingSide::QueenSide),
        Move::Castle { .. } => Some(CastlingSide::KingSide),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use study_core::cursor::Cursor;
    use study_core::tree::Tree;

    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Queen's Gambit Declined, chess.com export, White wins by move 53.
    const LONG_RECORD: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Round "-"]
[White "Pedro"]
[Black "Pablo"]
[Result "1-0"]
[TimeControl "600"]
[Termination "Pedro won by resignation"]

1. d4 e6 2. c4 d5 3. Nf3 Nf6 4. g3 dxc4 5. Bg2 c6 6. O-O b5 7. a4 Bb7 8. Qc2 a6
9. Rd1 Qc7 10. Bg5 Be7 11. e4 h6 12. Bxf6 Bxf6 13. d5 cxd5 14. exd5 Bxd5 15.
Rxd5 exd5 16. Qe2+ Be7 17. Nc3 Qd6 18. Re1 Nc6 19. Nxd5 Qxd5 20. Nh4 Qxg2+ 21.
Kxg2 O-O 22. Nf5 Bf6 23. Qf3 Rac8 24. Nd6 Rc7 25. axb5 Nd4 26. Qd5 Rd7 27.
Qxc4 Rxd6 28. bxa6 Ra8 29. Ra1 Ra7 30. Qc8+ Kh7 31. Ra4 Ne6 32. b4 Rd4 33. b5
Rxa4 34. Qc2+ g6 35. Qxa4 Bd4 36. Qa5 Re7 37. b6 Ng5 38. b7 Re2 39. Qxg5 Rxf2+
40. Kh3 hxg5 41. b8=Q f5 42. Qf8 Bg7 43. Qf7 g4+ 44. Kh4 Rxh2+ 45. Kg5 Ra2 46.
a7 Ra6 47. Qb7 Ra2 48. a8=Q Rxa8 49. Qxa8 Bh6+ 50. Kf6 Bg7+ 51. Ke6 g5 52. Qb7
f4 53. Qd5 1-0"#;

    #[test]
    fn test_parse_record_with_comments() {
        let record = "[Annotator \"User\"]\n\n1. d4 {center} d5 {symmetric} \n2. c4 {the gambit}";
        let mut engine = SanEngine::new();
        let moves = engine.parse_and_apply(record).unwrap();

        let sans: Vec<&str> = moves.iter().map(|m| m.notation()).collect();
        assert_eq!(sans, ["d4", "d5", "c4"]);
        assert_eq!(engine.start_position(), START_FEN);
        assert_eq!(moves[0].endpoints(), Some(("d2", "d4")));
        assert_eq!(
            moves[0].position_after(),
            "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_parse_full_game() {
        let mut engine = SanEngine::new();
        let moves = engine.parse_and_apply(LONG_RECORD).unwrap();

        assert_eq!(moves.len(), 105, "53 White moves and 52 Black moves");
        assert_eq!(moves[104].notation(), "Qd5");
        assert_eq!(engine.start_position(), START_FEN);

        // 6. O-O
        assert_eq!(moves[10].notation(), "O-O");
        assert!(moves[10].is_kingside_castle());
        assert!(!moves[10].is_queenside_castle());
        assert_eq!(moves[10].endpoints(), Some(("e1", "g1")));

        // 21... O-O
        assert_eq!(moves[41].notation(), "O-O");
        assert_eq!(moves[41].endpoints(), Some(("e8", "g8")));

        // 4... dxc4 and 41. b8=Q
        assert!(moves[7].is_capture());
        assert_eq!(moves[80].notation(), "b8=Q");
        assert!(moves[80].is_promotion());
        assert!(!moves[80].is_capture());
    }

    #[test]
    fn test_parse_skips_variations_and_nags() {
        let record = "1. e4 e5 $6 2. Nf3 (2. f4 exf4 (2... d5) 3. Nf3) 2... Nc6 3. Bb5 a6!?";
        let mut engine = SanEngine::new();
        let moves = engine.parse_and_apply(record).unwrap();

        let sans: Vec<&str> = moves.iter().map(|m| m.notation()).collect();
        assert_eq!(sans, ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    }

    #[test]
    fn test_parse_honors_fen_tag() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let record = format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1... c5 2. Nf3 d6");
        let mut engine = SanEngine::new();
        let moves = engine.parse_and_apply(&record).unwrap();

        let sans: Vec<&str> = moves.iter().map(|m| m.notation()).collect();
        assert_eq!(sans, ["c5", "Nf3", "d6"]);
        assert_eq!(engine.start_position(), fen);
    }

    #[test]
    fn test_parse_rejects_unreadable_movetext() {
        let mut engine = SanEngine::new();
        assert!(matches!(
            engine.parse_and_apply("1. e4 {never closed"),
            Err(NotationError::Syntax(_))
        ));
        assert!(matches!(
            engine.parse_and_apply("1. e4 (1. d4"),
            Err(NotationError::Syntax(_))
        ));
    }

    #[test]
    fn test_failed_parse_keeps_start_position() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let mut engine = SanEngine::new();
        engine
            .parse_and_apply(&format!("[FEN \"{fen}\"]\n\n1... c5"))
            .unwrap();

        let err = engine.parse_and_apply("1. d4 d5 2. hello").unwrap_err();
        assert!(matches!(err, NotationError::BadSan(_)));
        assert_eq!(engine.start_position(), fen, "failed record must not change the root");
    }

    #[test]
    fn test_validate_legal_and_illegal() {
        let engine = SanEngine::new();

        let mv = engine.validate(START_FEN, "e4").unwrap();
        assert_eq!(mv.notation(), "e4");
        assert_eq!(mv.endpoints(), Some(("e2", "e4")));
        assert!(!mv.is_capture());

        assert!(matches!(
            engine.validate(START_FEN, "Ke2"),
            Err(NotationError::IllegalMove(_))
        ));
        assert!(matches!(
            engine.validate(START_FEN, "zzz"),
            Err(NotationError::BadSan(_))
        ));
        assert!(matches!(
            engine.validate("not a position", "e4"),
            Err(NotationError::BadFen(_))
        ));
    }

    #[test]
    fn test_validate_canonicalizes_suffix() {
        let mut engine = SanEngine::new();
        let moves = engine
            .parse_and_apply("1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6")
            .unwrap();

        let mate = engine
            .validate(moves[5].position_after(), "Qxf7")
            .unwrap();
        assert_eq!(mate.notation(), "Qxf7#", "check and mate suffixes are recomputed");
        assert!(mate.is_capture());
    }

    #[test]
    fn test_queenside_castle_endpoints() {
        let fen = "r3kbnr/ppp1pppp/2nq4/3p1b2/3P1B2/2NQ4/PPP1PPPP/R3KBNR w KQkq - 6 5";
        let mut engine = SanEngine::new();
        let moves = engine
            .parse_and_apply(&format!("[FEN \"{fen}\"]\n\n5. 0-0-0"))
            .unwrap();

        assert_eq!(moves[0].notation(), "O-O-O");
        assert!(moves[0].is_queenside_castle());
        assert_eq!(moves[0].endpoints(), Some(("e1", "c1")));
    }

    #[test]
    fn test_en_passant_endpoints() {
        let mut engine = SanEngine::new();
        let moves = engine
            .parse_and_apply("1. e4 d5 2. e5 f5 3. exf6")
            .unwrap();

        let ep = &moves[4];
        assert_eq!(ep.notation(), "exf6");
        assert!(ep.is_capture());
        assert_eq!(ep.endpoints(), Some(("e5", "f6")));
    }

    #[test]
    fn test_record_review_flow() {
        let mut engine = SanEngine::new();
        let mut tree: Tree<SanMove> = Tree::new(engine.start_position());
        tree.load_game(&mut engine, LONG_RECORD).unwrap();

        assert_eq!(tree.main_line().len(), 105);
        assert_eq!(tree.cursor(), Cursor::new(0, 104));
        assert_eq!(tree.summary().ply_depth, 105);

        // Branch off the opening: 1... d5 instead of 1... e6.
        tree.first();
        tree.next();
        let alt = engine.validate(&tree.summary().position, "d5").unwrap();
        tree.add(alt);
        assert_eq!(tree.variation_count(), 2);
        assert_eq!(tree.summary().variation, 1);
        assert_eq!(tree.summary().ply_depth, 2);

        // The new line continues independently of the imported game.
        let reply = engine.validate(&tree.summary().position, "c4").unwrap();
        tree.add(reply);
        assert_eq!(tree.cursor(), Cursor::new(1, 1));
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("12."), None);
        assert_eq!(normalize_token("12"), None);
        assert_eq!(normalize_token("1-0"), None);
        assert_eq!(normalize_token("1/2-1/2"), None);
        assert_eq!(normalize_token("*"), None);
        assert_eq!(normalize_token("$14"), None);
        assert_eq!(normalize_token("12.e4"), Some("e4".to_string()));
        assert_eq!(normalize_token("12...c5"), Some("c5".to_string()));
        assert_eq!(normalize_token("e8=Q?!"), Some("e8=Q".to_string()));
        assert_eq!(normalize_token("0-0"), Some("O-O".to_string()));
        assert_eq!(normalize_token("0-0-0+"), Some("O-O-O+".to_string()));
    }
}
