//! Colored terminal rendering of the tree's current position.
//!
//! Everything here is driven by the `MoveRecord` trait and the FEN text
//! carried in position summaries; no chess types are consumed directly.

use colored::Colorize;
use study_core::move_record::MoveRecord;
use study_core::tree::Tree;

/// Prints the current position as a board diagram with a status column:
/// side to move, move number, tree address, last move and branch info.
pub fn print_position<M: MoveRecord>(tree: &Tree<M>) {
    let summary = tree.summary();
    let mut fields = summary.position.split_whitespace();
    let placement = fields.next().unwrap_or("8/8/8/8/8/8/8/8");
    let side = fields.next().unwrap_or("w");
    let fullmove = fields.nth(3).unwrap_or("1");
    let rows = board_rows(placement);

    // Header
    println!("      a   b   c   d   e   f   g   h");
    println!("    ┌───┬───┬───┬───┬───┬───┬───┬───┐");

    for (y, row) in rows.iter().enumerate().take(8) {
        let rank = 8 - y;
        print!("  {rank} │");

        for (x, &piece) in row.iter().enumerate().take(8) {
            let name = square_name(x, rank);
            let is_endpoint = matches!(
                &summary.last_move,
                Some((from, to)) if *from == name || *to == name
            );
            let cell = format!(" {piece} ");
            let symbol = match piece {
                ' ' if is_endpoint => cell.as_str().on_bright_black(),
                ' ' => cell.as_str().black(),
                p if p.is_ascii_uppercase() && is_endpoint => {
                    cell.as_str().on_bright_black().bright_yellow()
                }
                p if p.is_ascii_uppercase() => cell.as_str().bright_yellow(),
                _ if is_endpoint => cell.as_str().on_bright_black().bright_green(),
                _ => cell.as_str().bright_green(),
            };
            print!("{symbol}│");
        }

        // Side information
        match y {
            1 => {
                let turn = if side == "w" {
                    "White to move".bright_yellow()
                } else {
                    "Black to move".bright_green()
                };
                println!("   {turn}");
            }
            2 => println!("   move {fullmove}"),
            3 => {
                if tree.is_start() {
                    println!("   at the start position");
                } else {
                    println!("   at {}", tree.cursor());
                }
            }
            4 => match tree.current() {
                Some(node) => {
                    print!("   last: {}", node.mv.notation().bold());
                    if let Some(class) = move_class(&node.mv) {
                        print!(" {}", class.bright_red());
                    }
                    println!();
                }
                None => println!(),
            },
            5 => match tree.get(tree.cursor().next_ply()) {
                Ok(node) if !node.variations.is_empty() => {
                    let lines = node.variations.len() + 1;
                    println!("   {}", format!("branch point ahead: {lines} lines").bright_cyan());
                }
                _ => println!(),
            },
            6 => {
                if tree.variation_count() > 1 {
                    println!("   {} variations recorded", tree.variation_count());
                } else {
                    println!();
                }
            }
            _ => println!(),
        }

        if y < 7 {
            println!("    ├───┼───┼───┼───┼───┼───┼───┼───┤");
        }
    }

    // Footer
    println!("    └───┴───┴───┴───┴───┴───┴───┴───┘");
    println!("  {}", summary.position.bright_black());
}

/// Prints the active variation as numbered movetext.
///
/// The current ply is highlighted, moves with recorded alternatives are
/// marked and listed below with the addresses `goto` accepts.
pub fn print_line<M: MoveRecord>(tree: &Tree<M>) {
    let line = tree.active_line();
    if line.is_empty() {
        println!("  (no moves recorded)");
        return;
    }

    let at = tree.cursor();
    let base = tree.depth(line[0].id).map_or(0, |d| d - 1);

    print!("  ");
    for (i, node) in line.iter().enumerate() {
        let ply = base + i;
        if ply % 2 == 0 {
            print!("{}. ", ply / 2 + 1);
        } else if i == 0 {
            print!("{}... ", ply / 2 + 1);
        }

        let label = if node.variations.is_empty() {
            node.mv.notation().to_string()
        } else {
            format!("{}*", node.mv.notation())
        };
        if node.id == at {
            print!("{} ", label.on_bright_black().bold());
        } else if !node.variations.is_empty() {
            print!("{} ", label.bright_cyan());
        } else {
            print!("{label} ");
        }
    }
    println!();

    for node in line.iter().filter(|node| !node.variations.is_empty()) {
        let alternatives: Vec<String> = node
            .variations
            .iter()
            .filter_map(|&v| {
                tree.line(v)
                    .and_then(|l| l.first())
                    .map(|first| format!("{} at {}", first.mv.notation(), first.id))
            })
            .collect();
        println!(
            "    instead of {}: {}",
            node.mv.notation(),
            alternatives.join(", ").bright_cyan()
        );
    }
}

/// Describes a move played at the prompt or reached by navigation.
pub fn describe_move<M: MoveRecord>(mv: &M) -> String {
    let mut text = mv.notation().to_string();
    if let Some((from, to)) = mv.endpoints() {
        text.push_str(&format!(" ({from}-{to})"));
    }
    if let Some(class) = move_class(mv) {
        text.push_str(&format!(", {class}"));
    }
    text
}

fn move_class<M: MoveRecord>(mv: &M) -> Option<&'static str> {
    if mv.is_kingside_castle() {
        Some("castles short")
    } else if mv.is_queenside_castle() {
        Some("castles long")
    } else if mv.is_promotion() && mv.is_capture() {
        Some("capture and promotion")
    } else if mv.is_promotion() {
        Some("promotion")
    } else if mv.is_capture() {
        Some("capture")
    } else {
        None
    }
}

/// 8x8 grid of piece letters from a FEN placement field, ranks 8 down
/// to 1, `' '` for empty squares.
fn board_rows(placement: &str) -> Vec<Vec<char>> {
    placement
        .split('/')
        .map(|rank| {
            let mut row = Vec::with_capacity(8);
            for c in rank.chars() {
                if let Some(n) = c.to_digit(10) {
                    for _ in 0..n {
                        row.push(' ');
                    }
                } else {
                    row.push(c);
                }
            }
            row
        })
        .collect()
}

fn square_name(x: usize, rank: usize) -> String {
    let file = (b'a' + x as u8) as char;
    format!("{file}{rank}")
}
