//! Interactive terminal input.

use std::io::{self, BufRead, Write};

/// Source of interactive answers.
pub trait Prompter {
    /// Ask for a secret without echoing the input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the terminal cannot be read.
    fn secret(&mut self, prompt: &str) -> io::Result<String>;

    /// Ask for a line of visible input, returned without surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the terminal cannot be read.
    fn line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }

    fn line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_owned())
    }
}
