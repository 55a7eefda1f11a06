//! Line-oriented demonstration calculator
//!
//! Reads expressions from stdin and prints their decimal value with a
//! two-space indent. Settings are adjusted with `set precision N`,
//! `set timeout N` (milliseconds, negative = never) and
//! `set division limit N`.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use exact_reals::{Evaluator, RealError};

fn main() -> ExitCode {
    let stdin = io::stdin();
    let mut out = io::stdout();
    let mut ev = Evaluator::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("input error: {}", err);
                return ExitCode::from(1);
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let reply = match parse_set_command(input) {
            Some(command) => apply_set_command(&mut ev, command),
            None => match ev.eval_str(input) {
                Ok(value) => format!("  {}", value),
                Err(err) => format!("  {}", describe_error(&err)),
            },
        };
        if !reply.is_empty() {
            drop(writeln!(out, "{}", reply));
        }
        drop(out.flush());
    }
    ExitCode::SUCCESS
}

enum SetCommand {
    Precision(i64),
    Timeout(i64),
    DivisionLimit(i64),
    Malformed(String),
}

/// Recognize `set precision N`, `set timeout N` and
/// `set division limit N`; anything else parses as an expression.
fn parse_set_command(input: &str) -> Option<SetCommand> {
    let rest = input.strip_prefix("set ")?.trim();
    let (kind, text) = if let Some(text) = rest.strip_prefix("precision ") {
        ("precision", text)
    } else if let Some(text) = rest.strip_prefix("timeout ") {
        ("timeout", text)
    } else if let Some(text) = rest.strip_prefix("division limit ") {
        ("division limit", text)
    } else {
        return None;
    };
    Some(match text.trim().parse::<i64>() {
        Ok(n) => match kind {
            "precision" => SetCommand::Precision(n),
            "timeout" => SetCommand::Timeout(n),
            _ => SetCommand::DivisionLimit(n),
        },
        Err(_) => SetCommand::Malformed(format!(
            "'{}' is not a valid {} value",
            text.trim(),
            kind
        )),
    })
}

fn apply_set_command(ev: &mut Evaluator, command: SetCommand) -> String {
    match command {
        SetCommand::Precision(n) => {
            if n < 0 {
                return "  precision must be non-negative".to_string();
            }
            *ev = ev.clone().digits(n as u32);
            String::new()
        }
        SetCommand::Timeout(ms) => {
            *ev = ev.clone().timeout_ms(ms);
            String::new()
        }
        SetCommand::DivisionLimit(limit) => {
            *ev = ev.clone().division_limit(limit);
            String::new()
        }
        SetCommand::Malformed(msg) => format!("  {}", msg),
    }
}

fn describe_error(err: &RealError) -> String {
    match err {
        RealError::Cancelled => "Timeout..".to_string(),
        RealError::DivideByZero
        | RealError::PrecisionOverflow
        | RealError::Overflow
        | RealError::Arithmetic(_) => format!("ArithmeticError: {}", err),
        _ => format!("SyntaxError: {}", err),
    }
}
