//! Command line driver.
//!
//! With a file argument the file is run as a program; with `-load` the named
//! files are loaded first and the interactive prompt starts afterwards; with
//! no arguments the prompt starts directly. The prompt keeps reading lines
//! until the buffered input forms complete expressions, so multi-line
//! definitions work naturally.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use schemer::Error;
use schemer::eval::{create_global_frame, eval};
use schemer::frame::Frame;
use schemer::primitives::load_file;
use schemer::reader::read_all;
use schemer::value::Value;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let global = create_global_frame();
    match args.split_first() {
        Some((flag, files)) if flag.as_str() == "-load" => {
            for file in files {
                match load_file(file, &global) {
                    Ok(()) => {}
                    Err(Error::Exit) => return ExitCode::SUCCESS,
                    Err(err) => println!("Error: {err}"),
                }
            }
            repl(&global)
        }
        Some((file, [])) => run_file(file, &global),
        Some(_) => {
            eprintln!("usage: schemer [-load file ...] [file]");
            ExitCode::FAILURE
        }
        None => repl(&global),
    }
}

/// Evaluate every expression of a source file, printing each result.
fn run_file(path: &str, env: &Frame) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let exprs = match read_all(&source) {
        Ok(exprs) => exprs,
        Err(err) => {
            println!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    for expr in exprs {
        match eval(expr, env) {
            Ok(Value::Unspecified) => {}
            Ok(value) => println!("{value}"),
            Err(Error::Exit) => break,
            Err(err) => println!("Error: {err}"),
        }
    }
    ExitCode::SUCCESS
}

fn repl(env: &Frame) -> ExitCode {
    let stdin = io::stdin();
    let mut buffer = String::new();
    loop {
        if buffer.is_empty() {
            print!("scm> ");
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return ExitCode::SUCCESS;
            }
            Ok(_) => buffer.push_str(&line),
            Err(err) => {
                eprintln!("input error: {err}");
                return ExitCode::FAILURE;
            }
        }

        let exprs = match read_all(&buffer) {
            Ok(exprs) => exprs,
            // More lines may complete the expression; keep buffering.
            Err(err) if err.is_incomplete() => continue,
            Err(err) => {
                println!("Error: {err}");
                buffer.clear();
                continue;
            }
        };
        buffer.clear();

        for expr in exprs {
            match eval(expr, env) {
                Ok(Value::Unspecified) => {}
                Ok(value) => println!("{value}"),
                Err(Error::Exit) => return ExitCode::SUCCESS,
                Err(err) => println!("Error: {err}"),
            }
        }
    }
}
