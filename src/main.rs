use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::{Lox, LoxError, STACK_SIZE};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token list as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints each statement's AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a Lox program; without a file, starts an interactive prompt
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip the crate prefix from module paths
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

/// Print every diagnostic and return the exit status they call for.
fn report(errors: &[LoxError]) -> i32 {
    for e in errors {
        let stage: &str = if e.is_runtime() { "runtime" } else { "static" };
        debug!("Reporting {} error from line {:?}", stage, e.line());
        eprintln!("{}", e);
    }

    errors.iter().map(LoxError::exit_code).max().unwrap_or(0)
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<i32> {
    let source = read_file(filename)?;

    if json {
        let (tokens, errors) = scan_tokens(&source);
        let code = report(&errors);
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
        return Ok(code);
    }

    let mut tokenized = true;
    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { 65 })
}

fn parse(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let (tokens, mut errors) = scan_tokens(&source);

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    errors.extend(parser.take_errors());

    if !errors.is_empty() {
        return Ok(report(&errors));
    }

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    info!("Parse subcommand completed");
    Ok(0)
}

fn evaluate(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let mut lox = Lox::new();

    match lox.evaluate(&source) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }
        Err(errors) => Ok(report(&errors)),
    }
}

fn run_file(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let mut lox = Lox::new();

    let errors = lox.run(&source);
    info!("Program finished with {} error(s)", errors.len());

    Ok(report(&errors))
}

/// Line‑by‑line prompt sharing one session; errors never end it.
fn run_prompt() -> Result<i32> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        report(&lox.run(&line));
    }

    Ok(0)
}

fn dispatch(commands: &Commands) -> Result<i32> {
    match commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename } => parse(filename),
        Commands::Evaluate { filename } => evaluate(filename),
        Commands::Run {
            filename: Some(filename),
        } => run_file(filename),
        Commands::Run { filename: None } => run_prompt(),
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // Deep Lox recursion needs far more native stack than the main thread has.
    let code: i32 = thread::Builder::new()
        .name("rox".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || dispatch(&args.commands))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
