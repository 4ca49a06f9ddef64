use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use stubgen::config::{get_config_path, load_config, save_config, StubConfig};
use stubgen::generator::{GenerationReport, StubGenerator};
use stubgen::parser;

/// Java stubs for Groovy sources.
#[derive(Parser)]
#[command(name = "stubgen", about = "Generate Java stubs from Groovy sources")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Generate stubs for the project's sources
    Generate {
        /// Project path (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
        /// Output directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<String>,
        /// Exit with an error when any source fails
        #[arg(long)]
        strict: bool,
        /// Parse every stub as Java before writing it
        #[arg(long)]
        verify: bool,
        /// Sources to compile instead of scanning the source directories
        sources: Vec<String>,
    },
    /// Print the stubs of one source to stdout
    Render {
        /// Groovy source file
        file: String,
        /// Print the source model as JSON instead
        #[arg(long)]
        model: bool,
        /// Print the parse tree instead
        #[arg(long, conflicts_with = "model")]
        tree: bool,
        /// Leave out the implicit Groovy imports
        #[arg(long)]
        no_default_imports: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "stubgen=debug" } else { "stubgen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one command; `Ok(false)` means it completed but should exit non-zero.
fn run(cli: Cli) -> stubgen::errors::Result<bool> {
    match cli.command {
        Commands::Init { path, force } => {
            let project_path = resolve_path(path);
            let config_path = get_config_path(&project_path);
            if config_path.exists() && !force {
                println!(
                    "Configuration already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
                return Ok(true);
            }
            save_config(&project_path, &StubConfig::default())?;
            println!("Wrote {}", config_path.display());
        }
        Commands::Generate {
            path,
            output,
            strict,
            verify,
            sources,
        } => {
            let project_path = resolve_path(path);
            let mut config = load_config(&project_path)?;
            config.strict |= strict;
            config.verify_output |= verify;
            let strict = config.strict;

            let mut generator = StubGenerator::new(&project_path, config);
            if let Some(output) = output {
                generator = generator.with_output_dir(Path::new(&output));
            }
            let report = if sources.is_empty() {
                generator.generate_all()?
            } else {
                let locations: Vec<PathBuf> = sources.iter().map(PathBuf::from).collect();
                generator.generate(&locations)?
            };
            print_report(&report, generator.output_dir());
            if strict && report.failure_count() > 0 {
                return Ok(false);
            }
        }
        Commands::Render {
            file,
            model,
            tree,
            no_default_imports,
        } => {
            let location = PathBuf::from(&file);
            if tree {
                let source = std::fs::read_to_string(&location)?;
                let syntax = parser::parse(&file, &source)?;
                println!("{}", syntax.dump());
                return Ok(true);
            }

            let cwd = resolve_path(None);
            let mut config = load_config(&cwd)?;
            config.default_imports &= !no_default_imports;
            let generator = StubGenerator::new(&cwd, config);
            if model {
                let source_file = generator.build_model(&location)?;
                println!("{}", serde_json::to_string_pretty(&source_file)?);
            } else {
                let (_, stubs) = generator.render_source(&location)?;
                for stub in &stubs {
                    println!("{}", stub.text);
                }
            }
        }
    }
    Ok(true)
}

fn print_report(report: &GenerationReport, output_dir: &Path) {
    println!(
        "Compiled {} sources into {} stubs under {} in {}ms",
        report.source_count(),
        report.stub_count(),
        output_dir.display(),
        report.duration_ms
    );
    if report.failure_count() > 0 {
        println!("{} sources failed:", report.failure_count());
        for (location, error) in report.failures() {
            println!("  {}: {}", location, error);
        }
    }
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
