//! Interactive REPL for `.hk`.
//!
//! A session shares one [`Environment`] across every line entered, the same
//! way [`hk_lang::run_in`] lets a script builder reuse bindings between
//! calls. Because `.hk` blocks are indentation-delimited rather than
//! `end`-terminated, the REPL accumulates lines until it sees a blank line
//! (or a line that doesn't continue a just-opened block), then runs the
//! accumulated buffer as one chunk.

use std::io::{self, BufRead, Write};

use hk_lang::environment::Environment;
use hk_lang::{builtins, format_error, run_in};

use crate::colors::{bold, cyan, gray, red};

const HELP: &str = "\
Commands:
  :help            show this message
  :quit, :q        exit the REPL
  :reset           clear all bindings
An empty line ends a multi-line block and runs the buffered input.";

/// A trailing colon opens an indented block, so the REPL keeps reading
/// rather than running a single bare line immediately.
fn opens_block(line: &str) -> bool {
    line.trim_end().ends_with(':')
}

pub fn run_repl() {
    println!("{}", bold(&cyan("hk REPL")));
    println!("{}\n", gray("Type :help for commands, :quit to exit."));

    let mut env = Environment::new();
    builtins::seed(&mut env);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "hk> " } else { "  > " };
        print!("{}", green(prompt));
        io::stdout().flush().ok();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                eprintln!("{} {}", red("error:"), err);
                break;
            }
            None => break,
        };

        if buffer.is_empty() {
            match line.trim() {
                ":quit" | ":q" => break,
                ":help" => {
                    println!("{}", HELP);
                    continue;
                }
                ":reset" => {
                    env = Environment::new();
                    builtins::seed(&mut env);
                    println!("{}", gray("bindings cleared"));
                    continue;
                }
                "" => continue,
                _ => {}
            }
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);

        if line.trim().is_empty() {
            let source = buffer.trim_end().to_string();
            buffer.clear();
            if source.is_empty() {
                continue;
            }
            run_chunk(&source, &mut env);
        } else if !opens_block(&line) {
            let source = std::mem::take(&mut buffer);
            run_chunk(&source, &mut env);
        }
    }

    println!("{}", cyan("bye"));
}

fn run_chunk(source: &str, env: &mut Environment) {
    let mut padded = source.to_string();
    padded.push('\n');
    if let Err(err) = run_in(&padded, env) {
        eprint!("{}", format_error(&err, &padded, "<repl>"));
    }
}

fn green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_opener_detected_by_trailing_colon() {
        assert!(opens_block("if x < 3:"));
        assert!(!opens_block("x = 3"));
    }
}
