//! Sketch Assembly CLI
//!
//! Usage:
//!   sketch-assembly [OPTIONS] <SCENE>
//!
//! Options:
//!   -c, --config <FILE>        Builder configuration (TOML, `[builder]` table)
//!   -s, --strategy <STRATEGY>  greedy or exhaustive
//!   -t, --timeout-ms <MS>      Time budget in milliseconds
//!   -d, --debug-shape <NAME>   Log verbose build details for a shape (repeatable)
//!       --hierarchical         Build composite components first
//!   -v, --verbose              Debug logging
//!   -q, --quiet                Errors only
//!   -h, --help                 Print help

use std::path::PathBuf;

use clap::Parser;

use sketch_assembly::{assemble_with_options, AssembleOptions, BuilderConfig, BuiltShape, Scene, Strategy};

#[derive(Parser)]
#[command(name = "sketch-assembly")]
#[command(about = "Assemble composite shapes from recognized sketch primitives")]
struct Cli {
    /// Scene file with definitions, candidates and a target
    scene: PathBuf,

    /// Builder configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assignment strategy, overriding the configuration
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Time budget in milliseconds (negative for unbounded)
    #[arg(short, long, allow_negative_numbers = true)]
    timeout_ms: Option<i64>,

    /// Log verbose build details for this shape
    #[arg(short, long = "debug-shape")]
    debug_shape: Vec<String>,

    /// Build composite components bottom-up first
    #[arg(long)]
    hierarchical: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => match BuilderConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => BuilderConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }
    for name in cli.debug_shape {
        config = config.with_debug_shape(name);
    }

    let scene = match Scene::from_file(&cli.scene) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error loading scene '{}': {}", cli.scene.display(), e);
            std::process::exit(1);
        }
    };

    log::info!(
        "building {} from {} candidates ({})",
        scene.target,
        scene.candidates.len(),
        config.strategy
    );

    let options = AssembleOptions::new()
        .with_builder(config)
        .with_hierarchical(cli.hierarchical)
        .with_timeout_ms(cli.timeout_ms.unwrap_or(-1));

    match assemble_with_options(&scene, options) {
        Ok(shape) => print_shape(&shape),
        Err(e) => {
            match e.reason() {
                Some(reason) => eprintln!("Build failed ({}): {}", reason, e),
                None => eprintln!("Error: {}", e),
            }
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose || quiet {
        builder.filter_level(level);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn print_shape(shape: &BuiltShape) {
    println!("{} (confidence {:.3})", shape.label, shape.confidence);
    for (name, id) in &shape.component_map {
        match shape.component(name) {
            Some(part) if !part.sub_shapes.is_empty() => {
                let inner: Vec<String> = part.sub_shapes.iter().map(|c| c.to_string()).collect();
                println!("  {} = {} [{}]", name, part, inner.join(", "));
            }
            Some(part) => println!("  {} = {}", name, part),
            None => println!("  {} = {}", name, id),
        }
    }
    for (key, value) in &shape.attributes {
        println!("  [{} = {}]", key, value);
    }
}
