//! Interactive review loop.
//!
//! A rustyline prompt over the variation tree: navigation commands step
//! the cursor around, anything unrecognized is tried as a move in SAN
//! and recorded through [`Tree::add`].

use std::fs;
use std::path::Path;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use study_core::cursor::Cursor;
use study_core::rules::RulesEngine;
use study_core::tree::Tree;

use crate::display;
use crate::engine::{SanEngine, SanMove};

pub fn ui_loop(pgn: Option<&Path>) -> Result<(), String> {
    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;
    let mut engine = SanEngine::new();
    let mut tree: Tree<SanMove> = Tree::new(engine.start_position());

    if let Some(path) = pgn {
        load_record(&mut tree, &mut engine, path);
    }

    loop {
        display::print_position(&tree);
        println!();

        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let mut parts = line.split_whitespace();
                let Some(cmd) = parts.next() else {
                    continue;
                };
                println!();

                match cmd {
                    "next" | "n" => tree.next(),
                    "prev" | "p" | "back" | "b" => tree.prev(),
                    "first" | "start" => tree.first(),
                    "last" | "end" => tree.last(),
                    "line" | "l" => {
                        display::print_line(&tree);
                        println!();
                    }
                    "goto" | "g" => {
                        if let (Some(v), Some(p)) = (parts.next(), parts.next())
                            && let (Ok(variation), Ok(ply)) =
                                (v.parse::<usize>(), p.parse::<i32>())
                        {
                            jump(&mut tree, variation, ply);
                        } else {
                            println!("Usage: goto <variation> <ply>\n");
                        }
                    }
                    "load" => {
                        if let Some(path) = parts.next() {
                            load_record(&mut tree, &mut engine, Path::new(path));
                        } else {
                            println!("Usage: load <file>\n");
                        }
                    }
                    "help" | "h" | "?" => print_help(),
                    "quit" | "q" => break,
                    _ => play(&mut tree, &engine, cmd),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Validates `san` in the current position and records it in the tree,
/// reporting whether the move opened a new variation.
fn play(tree: &mut Tree<SanMove>, engine: &SanEngine, san: &str) {
    match engine.validate(&tree.summary().position, san) {
        Ok(mv) => {
            let described = display::describe_move(&mv);
            let before = tree.variation_count();
            tree.add(mv);
            println!("played {described}");
            if tree.variation_count() > before {
                println!(
                    "{}",
                    format!("new variation {} started", tree.cursor().variation).bright_cyan()
                );
            }
            println!();
        }
        Err(err) => println!("{}\n", err.to_string().bright_red()),
    }
}

fn jump(tree: &mut Tree<SanMove>, variation: usize, ply: i32) {
    let at = Cursor::new(variation, ply);
    if at.is_start() {
        tree.first();
        return;
    }
    match tree.get(at) {
        Ok(_) => tree.set_cursor(at),
        Err(err) => println!("{}\n", err.to_string().bright_red()),
    }
}

fn load_record(tree: &mut Tree<SanMove>, engine: &mut SanEngine, path: &Path) {
    let record = match fs::read_to_string(path) {
        Ok(record) => record,
        Err(err) => {
            println!("Cannot read {}: {err}\n", path.display());
            return;
        }
    };
    match tree.load_game(engine, &record) {
        Ok(()) => println!(
            "loaded {} plies from {}\n",
            tree.main_line().len(),
            path.display()
        ),
        Err(err) => println!("{}\n", err.to_string().bright_red()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  next, n            step forward; a branch point picks one line at random");
    println!("  prev, p            step back to the parent position");
    println!("  first              jump to the start position");
    println!("  last               jump to the end of the main line");
    println!("  line, l            show the active line with its branch points");
    println!("  goto <var> <ply>   jump to an address from the line listing");
    println!("  load <file>        import a game record, replacing the tree");
    println!("  quit, q            leave");
    println!("Anything else is tried as a move in SAN: e4, Nf3, O-O, exd5.");
    println!();
}
