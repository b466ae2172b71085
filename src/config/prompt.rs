use crate::utils::error::{LoadGenError, Result};
use std::io::{BufRead, IsTerminal, Write};
use std::str::FromStr;

/// Line-oriented questions on a terminal (or any reader/writer pair).
pub struct Prompter<R: BufRead, W: Write> {
    input: R,
    output: W,
    hide_secrets: bool,
}

impl Prompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Secrets are read without echo when stdin is a terminal.
    pub fn stdio() -> Self {
        let stdin = std::io::stdin();
        let hide_secrets = stdin.is_terminal();
        Self {
            input: stdin.lock(),
            output: std::io::stdout(),
            hide_secrets,
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// Like [`Prompter::ask`], but the answer is not echoed on a terminal.
    pub fn ask_secret(&mut self, field: &str, question: &str) -> Result<String> {
        if !self.hide_secrets {
            return self.ask(field, question);
        }
        loop {
            write!(self.output, "{}: ", question)?;
            self.output.flush()?;

            let answer = rpassword::read_password()?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
        }
    }

    /// Asks until a non-empty answer arrives. End of input is a missing value.
    pub fn ask(&mut self, field: &str, question: &str) -> Result<String> {
        loop {
            write!(self.output, "{}: ", question)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(LoadGenError::MissingConfigError {
                    field: field.to_string(),
                });
            }

            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
        }
    }

    pub fn ask_parsed<T>(&mut self, field: &str, question: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        loop {
            let answer = self.ask(field, question)?;
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "  invalid value '{}': {}", answer, e)?,
            }
        }
    }
}
