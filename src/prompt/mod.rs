use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{Result, UpdaterError};

/// Typing this at any question backs out of the current flow.
const EXIT_WORD: &str = "EXIT";
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Outcome of a question the user may back out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Value(T),
    Cancelled,
}

/// Line-oriented terminal interaction over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
    clear_screen: bool,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        let output = io::stdout();
        let clear_screen = output.is_terminal();
        Self::new(io::stdin().lock(), output, clear_screen)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, clear_screen: bool) -> Self {
        Self {
            input,
            output,
            clear_screen,
        }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.output
    }

    /// Write a line of text.
    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref()).map_err(write_error)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.clear_screen {
            write!(self.output, "{CLEAR_SCREEN}").map_err(write_error)?;
            self.output.flush().map_err(write_error)?;
        }
        Ok(())
    }

    /// Clear the screen and print an underlined, upper-cased menu title.
    pub fn title(&mut self, text: &str) -> Result<()> {
        self.clear()?;
        self.say(text.to_uppercase())?;
        self.say("=".repeat(text.chars().count()))?;
        self.say("")
    }

    /// Print `prompt` and read one line; `None` once input is exhausted.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").map_err(write_error)?;
        self.output.flush().map_err(write_error)?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| UpdaterError::io("unable to read from the terminal", e))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    /// Ask a free-form question. `EXIT` (any case) and end of input cancel.
    pub fn ask(&mut self, prompt: &str) -> Result<Answer<String>> {
        Ok(match self.read_line(prompt)? {
            Some(line) if line.trim().eq_ignore_ascii_case(EXIT_WORD) => Answer::Cancelled,
            Some(line) => Answer::Value(line.trim().to_owned()),
            None => Answer::Cancelled,
        })
    }

    /// Yes/no question; only `y` (any case) counts as yes.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self
            .read_line(prompt)?
            .is_some_and(|line| line.trim().eq_ignore_ascii_case("y")))
    }

    /// Wait for ENTER.
    pub fn pause(&mut self, prompt: &str) -> Result<()> {
        self.read_line(prompt).map(|_| ())
    }
}

fn write_error(err: io::Error) -> UpdaterError {
    UpdaterError::io("unable to write to the terminal", err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) type TestConsole = Console<Cursor<Vec<u8>>, Vec<u8>>;

    pub(crate) fn scripted(lines: &[&str]) -> TestConsole {
        let mut input = lines.join("\n");
        input.push('\n');
        Console::new(Cursor::new(input.into_bytes()), Vec::new(), false)
    }

    pub(crate) fn transcript(console: &TestConsole) -> String {
        String::from_utf8_lossy(console.output()).into_owned()
    }

    #[test]
    fn exit_word_cancels_in_any_case() {
        let mut console = scripted(&["exit", "  EXIT ", "Exit"]);
        for _ in 0..3 {
            assert_eq!(console.ask("> ").unwrap(), Answer::Cancelled);
        }
    }

    #[test]
    fn answers_are_trimmed() {
        let mut console = scripted(&["  1.16.5  "]);
        assert_eq!(
            console.ask("version: ").unwrap(),
            Answer::Value("1.16.5".to_owned())
        );
        assert_eq!(transcript(&console), "version: ");
    }

    #[test]
    fn end_of_input_cancels() {
        let mut console = Console::new(Cursor::new(Vec::new()), Vec::new(), false);
        assert_eq!(console.ask("> ").unwrap(), Answer::Cancelled);
        assert!(!console.confirm("sure? ").unwrap());
    }

    #[test]
    fn only_y_confirms() {
        let mut console = scripted(&["y", "Y", "yes", "n", ""]);
        assert!(console.confirm("? ").unwrap());
        assert!(console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
    }

    #[test]
    fn title_is_underlined() {
        let mut console = scripted(&[]);
        console.title("Set Paper version").unwrap();
        assert_eq!(
            transcript(&console),
            "SET PAPER VERSION\n=================\n\n"
        );
    }
}
