//! Terminal console for `sift`: an input line, a scrollback transcript of
//! research output, and a status bar.

mod command;
mod console;
mod feeders;
mod styles;
mod transcript;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use tui::{TuiActor, TuiMsg, TuiSurface};
