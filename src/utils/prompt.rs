use std::io::{self, BufRead, Write};

/// Yes/no decision point before anything is downloaded or installed.
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Asks on stdin until the answer is `y` or `n`. End of input counts as no.
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        let stdin = io::stdin();
        ask(question, &mut stdin.lock(), &mut io::stdout())
    }
}

/// Non-interactive answer, used for `--yes` and `--dry-run`.
pub struct Fixed(pub bool);

impl Confirm for Fixed {
    fn confirm(&self, question: &str) -> bool {
        log::debug!("auto-answering `{question}` with {}", self.0);
        self.0
    }
}

fn ask(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    loop {
        let _ = write!(output, "{question} [Y/N]: ");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(output);
                return false;
            }
            Ok(_) => {}
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => {}
        }
    }
}
