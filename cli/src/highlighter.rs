use nu_ansi_term::{Color, Style};
use reedline::StyledText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Plain,
    Number,
    Function,
    Identifier,
    Operator,
    Command,
}

impl Class {
    fn style(self) -> Style {
        let fg = match self {
            Class::Plain => Color::White,
            Class::Number => Color::Cyan,
            Class::Function => Color::Blue,
            Class::Identifier => Color::Red,
            Class::Operator => Color::White,
            Class::Command => Color::Magenta,
        };
        Style::new().fg(fg)
    }
}

/// Colors numbers, identifiers and operators of calculator input.
pub struct Highlighter;

/// Splits `line` into classified runs.
fn classify(line: &str) -> Vec<(Class, &str)> {
    let mut runs = Vec::new();
    let mut rest = line;

    if let Some(command) = line.strip_prefix(':') {
        let end = command.find(char::is_whitespace).unwrap_or(command.len()) + 1;
        runs.push((Class::Command, &line[..end]));
        rest = &line[end..];
    }

    while let Some(first) = rest.chars().next() {
        let (class, len) = if first.is_ascii_digit() || first == '.' {
            (Class::Number, number_len(rest))
        } else if first.is_ascii_alphabetic() || first == '_' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let is_call = rest[len..].trim_start().starts_with('(');
            (if is_call { Class::Function } else { Class::Identifier }, len)
        } else if "+-*/%^:=;,".contains(first) {
            (Class::Operator, first.len_utf8())
        } else {
            (Class::Plain, first.len_utf8())
        };
        runs.push((class, &rest[..len]));
        rest = &rest[len..];
    }
    runs
}

/// Length of the numeral at the start of `text`, exponent included.
fn number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = bytes
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .unwrap_or(bytes.len());
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            end = exp
                + bytes[exp..]
                    .iter()
                    .position(|b| !b.is_ascii_digit())
                    .unwrap_or(bytes.len() - exp);
        }
    }
    end
}

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        for (class, text) in classify(line) {
            output.push((class.style(), text.to_string()));
        }
        output
    }
}
