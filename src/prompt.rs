//! Run configuration: which PDF to read and where numbering starts
//!
//! [`Prompter`] asks on a terminal; [`ArgsOrPrompt`] takes command-line
//! values first and only asks for what is missing or invalid.

use crate::sequencer::SerialStart;
use crate::LabelError;
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const PATH_PROMPT: &str = "Please enter the path to your PDF file: ";
pub const START_PROMPT: &str = "Please enter the starting number (format: XXXX-YY): ";

/// Source of the per-run settings
pub trait ConfigSupplier {
    fn source_path(&mut self) -> Result<PathBuf, LabelError>;

    /// Keeps asking until a valid `XXXX-YY` value is given
    fn serial_start(&mut self) -> Result<SerialStart, LabelError>;

    /// Show a message to whoever supplies the values
    fn notify(&mut self, _message: &str) -> Result<(), LabelError> {
        Ok(())
    }
}

/// Interactive supplier reading answers line by line
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn ask(&mut self, question: &str) -> Result<String, LabelError> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(LabelError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> ConfigSupplier for Prompter<R, W> {
    fn source_path(&mut self) -> Result<PathBuf, LabelError> {
        let answer = self.ask(PATH_PROMPT)?;
        Ok(PathBuf::from(clean_path(&answer)))
    }

    fn serial_start(&mut self) -> Result<SerialStart, LabelError> {
        loop {
            let answer = self.ask(START_PROMPT)?;
            match answer.parse() {
                Ok(start) => return Ok(start),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    fn notify(&mut self, message: &str) -> Result<(), LabelError> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }
}

/// Strip whitespace and one pair of matching quotes
///
/// Terminals quote paths dropped onto them.
fn clean_path(answer: &str) -> &str {
    let trimmed = answer.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Command-line values first, then the fallback supplier
pub struct ArgsOrPrompt<S> {
    path: Option<PathBuf>,
    start: Option<String>,
    fallback: S,
}

impl<S: ConfigSupplier> ArgsOrPrompt<S> {
    pub fn new(path: Option<PathBuf>, start: Option<String>, fallback: S) -> Self {
        Self {
            path,
            start,
            fallback,
        }
    }

    /// Take positional arguments: `[pdf_file] [XXXX-YY]`
    pub fn from_args<I>(args: I, fallback: S) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let path = args.next().map(PathBuf::from);
        let start = args.next();
        Self::new(path, start, fallback)
    }
}

impl<S: ConfigSupplier> ConfigSupplier for ArgsOrPrompt<S> {
    fn source_path(&mut self) -> Result<PathBuf, LabelError> {
        match self.path.take() {
            Some(path) => Ok(path),
            None => self.fallback.source_path(),
        }
    }

    fn serial_start(&mut self) -> Result<SerialStart, LabelError> {
        if let Some(raw) = self.start.take() {
            match raw.parse() {
                Ok(start) => return Ok(start),
                Err(e) => {
                    log::warn!("ignoring start number argument {:?}: {}", raw, e);
                    self.fallback.notify(&e.to_string())?;
                }
            }
        }
        self.fallback.serial_start()
    }

    fn notify(&mut self, message: &str) -> Result<(), LabelError> {
        self.fallback.notify(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_inner().1).unwrap()
    }

    #[test]
    fn test_reprompts_until_valid() {
        let mut p = prompter("12340\n123-45\n1234-5\n1234-5-6\n1234-07\n");
        let start = p.serial_start().unwrap();
        assert_eq!(start.to_string(), "1234-07");

        let expected = [
            START_PROMPT,
            "Please use the format XXXX-YY\n",
            START_PROMPT,
            "Prefix must be 4 digits\n",
            START_PROMPT,
            "Start number must be 2 digits\n",
            START_PROMPT,
            "Invalid input. Please use the format XXXX-YY\n",
            START_PROMPT,
        ]
        .concat();
        assert_eq!(output(p), expected);
    }

    #[test]
    fn test_closed_input_stops_prompting() {
        let mut p = prompter("bad\n");
        assert!(matches!(p.serial_start(), Err(LabelError::InputClosed)));

        let mut p = prompter("");
        assert!(matches!(p.source_path(), Err(LabelError::InputClosed)));
    }

    #[test]
    fn test_path_is_cleaned() {
        let mut p = prompter("  '/tmp/order 1.pdf'  \r\n");
        assert_eq!(p.source_path().unwrap(), PathBuf::from("/tmp/order 1.pdf"));
        assert_eq!(output(p), PATH_PROMPT);

        assert_eq!(clean_path("\"C:\\orders\\po.pdf\""), "C:\\orders\\po.pdf");
        assert_eq!(clean_path("'unbalanced.pdf"), "'unbalanced.pdf");
    }

    #[test]
    fn test_arguments_skip_prompts() {
        let args = vec!["order.pdf".to_string(), "0042-10".to_string()];
        let mut supplier = ArgsOrPrompt::from_args(args, prompter(""));

        assert_eq!(supplier.source_path().unwrap(), PathBuf::from("order.pdf"));
        assert_eq!(supplier.serial_start().unwrap().to_string(), "0042-10");
    }

    #[test]
    fn test_invalid_start_argument_falls_back_to_prompt() {
        let args = vec!["order.pdf".to_string(), "42-10".to_string()];
        let mut supplier = ArgsOrPrompt::from_args(args, prompter("0042-10\n"));

        let start = supplier.serial_start().unwrap();
        assert_eq!(start.prefix(), "0042");
        assert_eq!(start.start(), 10);
        assert_eq!(
            output(supplier.fallback),
            format!("Prefix must be 4 digits\n{}", START_PROMPT)
        );
    }

    #[test]
    fn test_missing_arguments_are_prompted() {
        let mut supplier = ArgsOrPrompt::from_args(Vec::new(), prompter("po.pdf\n1234-01\n"));
        assert_eq!(supplier.source_path().unwrap(), PathBuf::from("po.pdf"));
        assert_eq!(supplier.serial_start().unwrap().start(), 1);
    }
}
