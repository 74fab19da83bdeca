use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use bricolage::{
    decode_schema, emit, reify_module, Bric, CompileError, Logger, ParseOptions, ReifyOptions,
    Sink, Target,
};

#[derive(Parser)]
#[command(name = "bricolage")]
#[command(about = "Generate Rust types from JSON Schema documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust source from a JSON Schema file
    Generate {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.rs` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name for the root type (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Parse, decode, and reify a schema without emitting anything
    Check {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,

        /// Name for the root type (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Parse a JSON document and pretty-print it
    Echo {
        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Accept comments, trailing commas, unquoted keys, and NaN/Infinity
        #[arg(long)]
        compat: bool,
    },
}

/// Writes emitted files next to the chosen output path, or to stdout.
struct FsSink {
    output: Option<PathBuf>,
    written: Vec<PathBuf>,
}

impl Sink for FsSink {
    fn write(&mut self, name: &str, text: &str) -> std::io::Result<()> {
        match &self.output {
            Some(path) => {
                fs::write(path, text)?;
                self.written.push(path.clone());
            }
            None => {
                let _ = name;
                print!("{}", text);
            }
        }
        Ok(())
    }
}

struct StderrLogger;

impl Logger for StderrLogger {
    fn info(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn warn(&mut self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

fn root_name(input: &Path, name: &Option<String>) -> String {
    match name {
        Some(name) => name.clone(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Schema".to_string()),
    }
}

fn load_module(
    input: &Path,
    name: &Option<String>,
) -> Result<bricolage::CodeModule, CompileError> {
    let text = fs::read_to_string(input).map_err(CompileError::Io)?;
    let document = Bric::parse(&text, &ParseOptions::strict())?;
    let schema = decode_schema(&document)?;
    let module = reify_module(&schema, &root_name(input, name), &ReifyOptions::default())?;
    Ok(module)
}

fn main() -> Result<(), CompileError> {
    let cli = Cli::parse();
    let mut logger = StderrLogger;

    match &cli.command {
        Commands::Generate { input, output, name } => {
            let module = load_module(input, name)?;
            let mut sink = FsSink {
                output: output.clone(),
                written: Vec::new(),
            };
            emit(&module, Target::Rust, &mut sink)?;
            for path in &sink.written {
                logger.info(&format!("Generated {}", path.display()));
            }
            Ok(())
        }

        Commands::Check { input, name } => {
            let module = load_module(input, name)?;
            logger.info(&format!(
                "{}: {} declarations",
                input.display(),
                module.types.len()
            ));
            Ok(())
        }

        Commands::Echo { input, compat } => {
            let text = fs::read_to_string(input).map_err(CompileError::Io)?;
            let options = if *compat {
                ParseOptions::compat()
            } else {
                ParseOptions::strict()
            };
            let value = Bric::parse(&text, &options)?;
            println!("{}", value.encode_pretty());
            Ok(())
        }
    }
}
