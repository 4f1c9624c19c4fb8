use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gparse::ast::AstPrinter;
use gparse::parser::Lexer;
use gparse::ParserConfig;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const GROOVY_EXTENSIONS: &[&str] = &["groovy", "gvy", "gradle"];

#[derive(Parser)]
#[command(name = "gparse")]
#[command(about = "Groovy parser")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file, or every Groovy file below a directory
    Parse {
        /// Input file or directory
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Print the canonical source form of each parsed file
        #[arg(short, long)]
        print: bool,

        /// Show the full syntax tree
        #[arg(short, long)]
        detailed: bool,
    },

    /// Lexically analyze a Groovy file
    Lex {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show token locations
        #[arg(short, long)]
        locations: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { input, print, detailed } => {
            let config = ParserConfig::from_env()?;
            let failures = parse_path(input, config, *print, *detailed)?;
            if failures > 0 {
                anyhow::bail!("{} file(s) failed to parse", failures);
            }
        }
        Commands::Lex { input, locations } => {
            lex_file(input, *locations)?;
        }
    }

    Ok(())
}

fn is_groovy_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GROOVY_EXTENSIONS.contains(&ext))
}

/// Parse `input` and report each file; returns the number of failures
fn parse_path(input: &Path, config: ParserConfig, print: bool, detailed: bool) -> Result<usize> {
    if input.is_file() {
        return Ok(usize::from(!parse_one(input, config, print, detailed)?));
    }

    let mut failures = 0;
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", input.display()))?;
        if entry.file_type().is_file() && is_groovy_file(entry.path()) && !parse_one(entry.path(), config, print, detailed)? {
            failures += 1;
        }
    }
    Ok(failures)
}

fn parse_one(path: &Path, config: ParserConfig, print: bool, detailed: bool) -> Result<bool> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match gparse::parser::parse_groovy_with_config(&source, config) {
        Ok(unit) => {
            println!("ok    {}", path.display());
            if detailed {
                println!("{:#?}", unit);
            }
            if print {
                print!("{}", AstPrinter::new().print(&unit));
            }
            Ok(true)
        }
        Err(err) => {
            println!("error {}: {}", path.display(), err);
            Ok(false)
        }
    }
}

fn lex_file(input: &Path, locations: bool) -> Result<()> {
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let tokens = Lexer::new(&source)
        .tokenize()
        .map_err(|e| anyhow::anyhow!("Lexical error: {}", e))?;

    for token in tokens {
        if locations {
            println!("{:?} at {}:{}", token.token_type(), token.location().line, token.location().column);
        } else {
            println!("{:?}: '{}'", token.token_type(), token.lexeme());
        }
    }

    Ok(())
}
