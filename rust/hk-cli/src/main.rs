//! `hk` — run or interactively explore `.hk` scripts.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use hk_cli::colors::red;
use hk_lang::{builtins, environment::Environment, format_error, parse_source, run_in};

#[derive(Parser)]
#[command(
    name = "hk",
    version,
    about = "A tree-walking interpreter for the .hk matrix scripting language",
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}

Examples:
  hk script.hk                 Run a script
  hk --dump-tokens script.hk   Print the token stream instead of running it
  hk --dump-ast script.hk      Print the parsed AST instead of running it
  hk repl                      Start an interactive session
"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Script to run. Omit together with a subcommand to start the REPL.
    file: Option<PathBuf>,

    /// Bind `pretty_print = False` before running, so `print` falls back to
    /// `str`-style rendering for matrices.
    #[arg(long)]
    no_pretty_print: bool,

    /// Lex the file and print its token stream as JSON instead of running it.
    #[arg(long)]
    dump_tokens: bool,

    /// Parse the file and print its AST as JSON instead of running it.
    #[arg(long)]
    dump_ast: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive REPL.
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Repl) => {
            hk_cli::repl::run_repl();
            ExitCode::SUCCESS
        }
        None => match cli.file {
            Some(path) => run_file(&path, &cli),
            None => {
                hk_cli::repl::run_repl();
                ExitCode::SUCCESS
            }
        },
    }
}

fn run_file(path: &PathBuf, cli: &Cli) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(mut s) => {
            if !s.ends_with('\n') {
                s.push('\n');
            }
            s
        }
        Err(err) => {
            eprintln!("{} {}: {}", red("error:"), path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let filename = path.display().to_string();

    if cli.dump_tokens {
        return dump_tokens(&source, &filename);
    }
    if cli.dump_ast {
        return dump_ast(&source, &filename);
    }

    let mut env = Environment::new();
    builtins::seed(&mut env);
    if cli.no_pretty_print {
        env.set("pretty_print", hk_lang::value::Value::Boolean(false));
    }

    match run_in(&source, &mut env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", format_error(&err, &source, &filename));
            ExitCode::FAILURE
        }
    }
}

fn dump_tokens(source: &str, filename: &str) -> ExitCode {
    match hk_lang::compiler::lexer::Lexer::new(source).tokenize() {
        Ok(tokens) => {
            println!("{}", serde_json::to_string_pretty(&tokens).expect("tokens serialize"));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", format_error(&hk_lang::HkError::Lex(err), source, filename));
            ExitCode::FAILURE
        }
    }
}

fn dump_ast(source: &str, filename: &str) -> ExitCode {
    match parse_source(source) {
        Ok(program) => {
            println!("{}", serde_json::to_string_pretty(&program).expect("ast serializes"));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", format_error(&err, source, filename));
            ExitCode::FAILURE
        }
    }
}
