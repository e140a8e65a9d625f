use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::lox::Lox;
use lox::parser::Parser;
use lox::scanner::{scan_partial, scan_tokens};
use lox::token::Token;

/// Exit status when the input file cannot be read.
const EXIT_NO_INPUT: i32 = 66;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Print error reports as JSON lines
    #[arg(long, global = true)]
    json_errors: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a Lox program; starts the interactive prompt without a file
    Run { filename: Option<PathBuf> },

    /// Starts the interactive prompt
    Repl,
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

/// Like [`read_file`], but an unreadable file ends the process.
fn load(filename: &PathBuf) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_NO_INPUT);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("lox_interpreter::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(errors: &[&LoxError], json: bool) {
    for e in errors {
        debug!("Reporting: {}", e);

        if json {
            match serde_json::to_string(&e.report()) {
                Ok(line) => eprintln!("{}", line),
                Err(_) => eprintln!("{}", e),
            }
        } else {
            eprintln!("{}", e);
        }
    }
}

fn run_file(filename: &PathBuf, json_errors: bool) {
    info!("Running file {:?}", filename);

    let source: String = load(filename);
    let mut session = Lox::new();

    if let Err(e) = session.run(&source) {
        report(&e.errors(), json_errors);
        std::process::exit(e.exit_code());
    }

    info!("Program executed successfully");
}

fn run_prompt(json_errors: bool) -> Result<()> {
    info!("Starting interactive prompt");

    let mut session = Lox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            info!("End of input, leaving prompt");
            return Ok(());
        }

        // Errors end the current line only; the session keeps its globals.
        if let Err(e) = session.run(&line) {
            report(&e.errors(), json_errors);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let json_errors: bool = args.json_errors;

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let source: String = load(&filename);
            let (tokens, errors) = scan_partial(&source);

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }

            if !errors.is_empty() {
                report(&errors.iter().collect::<Vec<_>>(), json_errors);

                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let source: String = load(&filename);

            let parsed = scan_tokens(&source)
                .and_then(|tokens: Vec<Token>| Parser::new(tokens).parse_expression());

            match parsed {
                Ok(expr) => {
                    let ast_str: String = AstPrinter.print(&expr);

                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }

                Err(errors) => {
                    report(&errors.iter().collect::<Vec<_>>(), json_errors);
                    std::process::exit(65);
                }
            }
        }

        Commands::Evaluate { filename } => {
            let source: String = load(&filename);
            let mut session = Lox::new();

            match session.evaluate(&source) {
                Ok(value) => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }

                Err(e) => {
                    report(&e.errors(), json_errors);
                    std::process::exit(e.exit_code());
                }
            }
        }

        Commands::Run {
            filename: Some(filename),
        } => run_file(&filename, json_errors),

        Commands::Run { filename: None } | Commands::Repl => run_prompt(json_errors)?,
    }

    Ok(())
}
