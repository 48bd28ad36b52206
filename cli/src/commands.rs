//! REPL commands: lines starting with `:`.

use qcalc::RoundingMode;
use std::path::PathBuf;
use thiserror::Error;

pub const HELP: &str = "\
Expressions:
  1 + 2 * 3            evaluate
  x := 2; x ^ 10       assign variables, separate statements with ';'

Commands:
  :def f(a, b) = expr  define a function
  :undef name          remove a variable or function
  :vars                list symbols
  :addons              list addons (* marks active ones)
  :enable id           activate an addon
  :disable id          deactivate an addon
  :save path           write the symbol table to a file
  :load path           replace the symbol table from a file
  :precision bits      set the working precision
  :digits n            set the displayed fractional digits
  :rounding mode       nearest, toward_zero, up, down or away_from_zero
  :help                show this text
  :quit                leave";

/// Command names, for completion.
pub const NAMES: &[&str] = &[
    ":def",
    ":undef",
    ":vars",
    ":addons",
    ":enable",
    ":disable",
    ":save",
    ":load",
    ":precision",
    ":digits",
    ":rounding",
    ":help",
    ":quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Symbols,
    Define {
        name: String,
        arguments: Vec<String>,
        expression: String,
    },
    Undefine(String),
    Addons,
    Enable(String),
    Disable(String),
    Save(PathBuf),
    Load(PathBuf),
    Precision(usize),
    Digits(usize),
    Rounding(RoundingMode),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command ':{0}' (try :help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Rounding(#[from] qcalc::number::UnknownRoundingMode),
}

/// Parses a command line. Returns `None` for anything that is not a
/// command.
pub fn parse_command(line: &str) -> Option<Result<Command, CommandError>> {
    let line = line.trim().strip_prefix(':')?;
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    Some(parse_named(name, rest))
}

fn parse_named(name: &str, rest: &str) -> Result<Command, CommandError> {
    let word = |usage| match rest {
        "" => Err(CommandError::Usage(usage)),
        word => Ok(word.to_string()),
    };
    let count = |usage| rest.parse::<usize>().map_err(|_| CommandError::Usage(usage));

    match name {
        "help" | "h" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "vars" => Ok(Command::Symbols),
        "addons" => Ok(Command::Addons),
        "def" => parse_definition(rest),
        "undef" => word(":undef name").map(Command::Undefine),
        "enable" => word(":enable id").map(Command::Enable),
        "disable" => word(":disable id").map(Command::Disable),
        "save" => word(":save path").map(|p| Command::Save(p.into())),
        "load" => word(":load path").map(|p| Command::Load(p.into())),
        "precision" => count(":precision bits").map(Command::Precision),
        "digits" => count(":digits n").map(Command::Digits),
        "rounding" => Ok(Command::Rounding(rest.parse()?)),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// `name(a, b) = expression`, or `name = expression` without arguments.
fn parse_definition(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = ":def name(a, b) = expression";
    let (head, expression) = rest.split_once('=').ok_or(CommandError::Usage(USAGE))?;
    let head = head.trim();
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(CommandError::Usage(USAGE));
    }

    let (name, arguments) = match head.split_once('(') {
        Some((name, args)) => {
            let args = args.trim().strip_suffix(')').ok_or(CommandError::Usage(USAGE))?;
            let arguments = args
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            (name.trim(), arguments)
        }
        None => (head, Vec::new()),
    };
    if name.is_empty() {
        return Err(CommandError::Usage(USAGE));
    }
    Ok(Command::Define {
        name: name.to_string(),
        arguments,
        expression: expression.to_string(),
    })
}
