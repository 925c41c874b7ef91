use crate::{
    command::{Command, parse_command},
    styles,
    transcript::Transcript,
    view::ViewSnap,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sift_actors::{Output, ResearchMsg, SessionSnapshot};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// What a submitted line asks the actor to do.
pub enum Action {
    Research(ResearchMsg),
    Quit,
}

pub enum KeyOutcome {
    Submit(String),
    Quit,
}

/// Terminal-free console state: input line, transcript and session view.
pub struct Console {
    input: String,
    input_cursor: usize,
    transcript: Transcript,
    scroll: usize, // from bottom
    session: SessionSnapshot,
    sources: usize,
    spin_idx: usize,
    dirty: bool,
}

impl Console {
    pub fn new(sources: usize) -> Self {
        let mut transcript = Transcript::default();
        transcript.push(
            "Type a question to search the web and analyze the top results. `/help` lists commands.",
            styles::system(),
        );
        transcript.push_blank();
        Self {
            input: String::new(),
            input_cursor: 0,
            transcript,
            scroll: 0,
            session: SessionSnapshot::default(),
            sources,
            spin_idx: 0,
            dirty: true,
        }
    }

    /// Returns whether a redraw is due and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn snap(&self) -> ViewSnap<'_> {
        ViewSnap {
            input: &self.input,
            input_cursor: self.input_cursor,
            lines: self.transcript.lines(),
            scroll: self.scroll,
            busy: self.session.busy,
            spinner: self.spinner(),
            sources: self.sources,
            documents: self.session.documents,
        }
    }

    fn spinner(&self) -> &'static str {
        if self.session.busy {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    pub fn step_spinner(&mut self) {
        if self.session.busy {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn push(&mut self, text: impl Into<String>, style: ratatui::style::Style) {
        self.transcript.push(text, style);
        self.dirty = true;
    }

    fn push_blank(&mut self) {
        self.transcript.push_blank();
        self.dirty = true;
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push(text, styles::error());
    }

    /// Render one update from the research session.
    pub fn apply_output(&mut self, out: Output) {
        match out {
            Output::Status(text) => self.push(text, styles::status()),
            Output::Error(text) => self.push(text, styles::error()),
            Output::Chunk(fragment) => {
                self.transcript.append_fragment(&fragment, styles::reply_text());
                self.dirty = true;
            }
            Output::Banner(text) => {
                self.push_blank();
                self.push(text, styles::banner());
                self.push_blank();
            }
            Output::Session(snapshot) => {
                if !snapshot.busy {
                    self.transcript.close_reply();
                }
                self.session = snapshot;
                self.dirty = true;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<KeyOutcome> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Some(KeyOutcome::Quit),
            (KeyCode::PageUp, _) => self.scroll = self.scroll.saturating_add(5),
            (KeyCode::PageDown, _) => self.scroll = self.scroll.saturating_sub(5),
            (KeyCode::Up, _) => self.scroll = self.scroll.saturating_add(1),
            (KeyCode::Down, _) => self.scroll = self.scroll.saturating_sub(1),
            (KeyCode::Enter, _) => {
                let line = std::mem::take(&mut self.input);
                self.input_cursor = 0;
                self.scroll = 0;
                self.dirty = true;
                return Some(KeyOutcome::Submit(line));
            }
            (KeyCode::Left, _) => self.cursor_left(),
            (KeyCode::Right, _) => self.cursor_right(),
            (KeyCode::Home, _) => self.input_cursor = 0,
            (KeyCode::End, _) => self.input_cursor = self.input.len(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Esc, _) => {
                self.input.clear();
                self.input_cursor = 0;
            }
            (KeyCode::Char(ch), _) => {
                self.input.insert(self.input_cursor, ch);
                self.input_cursor += ch.len_utf8();
            }
            _ => return None,
        }
        self.dirty = true;
        None
    }

    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor - 1;
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    /// Turn a submitted line into an action. Console-only commands are
    /// answered here and yield `None`.
    pub fn submit(&mut self, line: &str) -> Option<Action> {
        match parse_command(line)? {
            // Busy and empty-session checks belong to the research actor.
            Command::Search(query) => Some(Action::Research(ResearchMsg::Search {
                query,
                max_sources: self.sources,
            })),
            Command::Ask(question) => Some(Action::Research(ResearchMsg::FollowUp { question })),
            Command::Sources(None) => {
                self.push(format!("Sources per search: {}", self.sources), styles::label());
                self.push_blank();
                None
            }
            Command::Sources(Some(n)) => {
                self.sources = n;
                self.push(format!("✓ Sources per search set to {n}."), styles::system());
                self.push_blank();
                None
            }
            Command::Help => {
                self.push("Commands:", styles::label());
                for row in [
                    "  <text>          search the web and analyze the top results",
                    "  /ask <text>     follow-up question about the last sources",
                    "  /sources        show the number of sources per search",
                    "  /sources <n>    set it (1 to 10)",
                    "  /quit           exit (also Ctrl-C)",
                    "  PgUp/PgDn ↑/↓   scroll the transcript",
                ] {
                    self.push(row, styles::value());
                }
                self.push_blank();
                None
            }
            Command::Quit => Some(Action::Quit),
            Command::Invalid(msg) => {
                self.push_error(format!("× {msg}"));
                None
            }
            Command::Unknown(s) => {
                self.push_error(format!("× Unknown command: {s}"));
                self.push("Try `/help`.", styles::dim());
                self.push_blank();
                None
            }
        }
    }
}
