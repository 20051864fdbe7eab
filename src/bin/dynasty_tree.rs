use anyhow::Result;
use clap::Parser;
use dynastygen::tree::{dynasty_dot, load_characters, load_localisations, open_in_viewer, render_graph, select_by_dynasty};
use dynastygen::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dynasty-tree")]
#[command(about = "Render a dynasty's family tree from a character file")]
struct Args {
    /// Dynasty identifier (or a single character identifier)
    dynasty: String,

    /// Characters file; defaults to the configured mod or base game copy
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Graphviz layout engine
    #[arg(long, default_value = "dot")]
    engine: String,

    #[arg(long, default_value = "png", value_parser = ["png", "pdf", "svg", "jpg"])]
    format: String,

    /// Output path without extension [default: <dynasty>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only write the DOT source, do not run Graphviz
    #[arg(long)]
    dot_only: bool,

    /// Open the rendered file when done
    #[arg(long)]
    view: bool,

    /// Print selection details
    #[arg(long)]
    debug: bool,

    #[arg(long)]
    base_game_dir: Option<PathBuf>,

    #[arg(long)]
    mod_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if args.base_game_dir.is_some() {
        config.game.base_game_dir = args.base_game_dir.clone();
    }
    if args.mod_dir.is_some() {
        config.game.mod_dir = args.mod_dir.clone();
    }

    let level = if args.debug { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", level)
    ).init();

    let file = args
        .file
        .clone()
        .or_else(|| config.game.resolve_characters_file())
        .unwrap_or_else(|| config.game.characters_file.clone());

    let chars = match load_characters(&file) {
        Ok(chars) => chars,
        Err(e) => {
            eprintln!("Characters file not found: {} ({})", file.display(), e);
            return Ok(ExitCode::from(2));
        }
    };

    if args.debug {
        let (selected, fields) = select_by_dynasty(&chars, &args.dynasty);
        println!("Total characters parsed: {}", fields.len());
        println!("Initial selection size: {}", selected.len());
        for cid in &selected {
            let info = &fields[cid];
            println!(
                "  SELECTED: {}  name={:?} dynasty={:?} father={:?} mother={:?}",
                cid, info.name, info.dynasty, info.father, info.mother
            );
        }
    }

    let localisations = load_localisations(config.game.mod_dir.as_deref(), config.game.base_game_dir.as_deref());

    let Some(dot) = dynasty_dot(&chars, &args.dynasty, &localisations) else {
        eprintln!(
            "No characters found for dynasty \"{}\". Check the identifier and try again.",
            args.dynasty
        );
        return Ok(ExitCode::from(3));
    };

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from(&args.dynasty));
    match render_graph(&dot, &output, &args.engine, &args.format, args.dot_only) {
        Ok(path) => {
            println!("Graph written to {}", path.display());
            if args.view && !args.dot_only {
                open_in_viewer(&path);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Failed to render graph: {}", e);
            eprintln!("Ensure Graphviz is installed and `dot` is in your PATH.");
            Ok(ExitCode::from(4))
        }
    }
}
