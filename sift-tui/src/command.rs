use sift_config::{clamp_sources, SOURCE_RANGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),         // plain text
    Ask(String),            // /ask <question>
    Sources(Option<usize>), // /sources | /sources <n>
    Help,                   // /help
    Quit,                   // /quit or /exit
    Invalid(String),
    Unknown(String),
}

/// Parse one submitted input line. `None` for blank input.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.starts_with('/') {
        return Some(Command::Search(trimmed.to_string()));
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let cmd = match verb {
        "/ask" => match rest {
            Some(question) => Command::Ask(question.to_string()),
            None => Command::Invalid("/ask needs a question".into()),
        },
        "/sources" => match rest.map(str::parse::<usize>) {
            None => Command::Sources(None),
            Some(Ok(n)) => Command::Sources(Some(clamp_sources(n))),
            Some(Err(_)) => Command::Invalid(format!(
                "/sources expects a number from {} to {}",
                SOURCE_RANGE.start(),
                SOURCE_RANGE.end()
            )),
        },
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    };
    Some(cmd)
}
