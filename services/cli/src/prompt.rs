//! Yes/no confirmation

use std::io::{self, BufRead, Write};

use common::{MeteError, MeteResult};

pub trait Confirm {
    fn confirm(&mut self, question: &str) -> MeteResult<bool>;
}

/// Answers every question the same way (`--yes`)
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, question: &str) -> MeteResult<bool> {
        tracing::debug!("{} (assumed yes)", question);
        Ok(true)
    }
}

/// Asks on `output` and reads the answer from `input`
///
/// Repeats until the answer is yes/y or no/n. End of input counts as no.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> MeteResult<bool> {
        loop {
            write!(self.output, "{} (y/n) ", question).map_err(prompt_error)?;
            self.output.flush().map_err(prompt_error)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(prompt_error)? == 0 {
                return Ok(false);
            }
            match line.trim() {
                "yes" | "y" => return Ok(true),
                "no" | "n" => return Ok(false),
                _ => writeln!(self.output, "Please enter 'yes' or 'no'.").map_err(prompt_error)?,
            }
        }
    }
}

fn prompt_error(error: io::Error) -> MeteError {
    MeteError::invalid_input(format!("Cannot read the answer: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_repeats_until_valid_answer() {
        let mut output = Vec::new();
        let answer = LinePrompt::new(Cursor::new("maybe\ny\n"), &mut output)
            .confirm("Delete?")
            .expect("answered");

        assert!(answer);
        let shown = String::from_utf8(output).expect("utf8");
        assert_eq!(shown.matches("Delete? (y/n)").count(), 2);
        assert!(shown.contains("Please enter 'yes' or 'no'."));
    }

    #[test]
    fn test_end_of_input_is_no() {
        let answer = LinePrompt::new(Cursor::new(""), Vec::new())
            .confirm("Delete?")
            .expect("answered");
        assert!(!answer);
    }
}
