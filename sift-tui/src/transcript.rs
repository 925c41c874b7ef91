use ratatui::style::Style;

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptLine {
    pub text: String,
    pub style: Style,
}

impl TranscriptLine {
    pub fn new(text: String, style: Style) -> Self {
        Self { text, style }
    }
}

/// Scrollback buffer. Streamed reply fragments grow one open entry in place
/// until any other line is pushed.
#[derive(Default)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
    reply_open: bool,
}

impl Transcript {
    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn push(&mut self, text: impl Into<String>, style: Style) {
        self.reply_open = false;
        self.lines.push(TranscriptLine::new(text.into(), style));
    }

    pub fn push_blank(&mut self) {
        self.push(String::new(), Style::default());
    }

    /// Append a fragment verbatim to the open reply, opening one if needed.
    pub fn append_fragment(&mut self, fragment: &str, style: Style) {
        if self.reply_open {
            if let Some(last) = self.lines.last_mut() {
                last.text.push_str(fragment);
                return;
            }
        }
        self.lines
            .push(TranscriptLine::new(fragment.to_string(), style));
        self.reply_open = true;
    }

    /// End the open reply so the next fragment starts a new entry.
    pub fn close_reply(&mut self) {
        self.reply_open = false;
    }
}
