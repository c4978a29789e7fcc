//! Interactive mode selection for runs started without `--mode`.

use std::io::{BufRead, IsTerminal};

use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

const MODE_PROMPT: &str = "Enter mode (sequential/parallel)";

/// Ask the user for an execution mode.
///
/// On a TTY this is a dialoguer text prompt; otherwise one line is read from
/// stdin. The answer is returned verbatim so the caller can report invalid
/// values. Returns `None` on Ctrl+C or end of input.
pub fn ask_mode() -> anyhow::Result<Option<String>> {
    if std::io::stdin().is_terminal() {
        let answer = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(MODE_PROMPT)
            .allow_empty(true)
            .interact_text();
        handle_interrupt(answer)
    } else {
        println!("{}:", MODE_PROMPT);
        read_answer(std::io::stdin().lock())
    }
}

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_answer(mut input: impl BufRead) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
