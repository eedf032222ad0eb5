mod display;
mod engine;
mod ui;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
struct Cli {
    /// Game record (PGN) loaded into the tree on startup
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pgn: Option<PathBuf>,
}

fn main() {
    let args = Cli::parse();

    if let Some(path) = &args.pgn
        && !path.exists()
    {
        eprintln!("File does not exist: {}", path.display());
        std::process::exit(1);
    }

    ui::ui_loop(args.pgn.as_deref()).unwrap_or_else(|err| {
        eprintln!("Failed to initialize UI: {err}");
    });
}
