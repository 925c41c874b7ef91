use crate::transcript::TranscriptLine;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use textwrap::wrap;
use unicode_width::UnicodeWidthChar;

/// Everything one frame needs, copied out of the actor.
pub struct ViewSnap<'a> {
    pub input: &'a str,
    pub input_cursor: usize,
    pub lines: &'a [TranscriptLine],
    pub scroll: usize,
    pub busy: bool,
    pub spinner: &'static str,
    pub sources: usize,
    pub documents: usize,
}

pub fn draw<B: Backend>(term: &mut Terminal<B>, snap: &ViewSnap<'_>) -> Result<()> {
    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " Sift ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "multi-source research • /help for commands",
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(header, layout[0]);

        // Transcript, scrolled from the bottom
        let visible_h = layout[1].height.saturating_sub(2) as usize;
        let content_width = layout[1].width.saturating_sub(2) as usize;
        let wrapped = wrap_transcript(snap.lines, content_width);
        let (start, end) = visible_window(wrapped.len(), visible_h, snap.scroll);

        let items: Vec<ListItem> = wrapped[start..end]
            .iter()
            .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
            .collect();

        let body =
            List::new(items).block(Block::default().borders(Borders::ALL).title(" Transcript "));
        frame.render_widget(body, layout[1]);

        let input_title = if snap.busy {
            " Input (busy: new requests are ignored) "
        } else {
            " Input "
        };
        let (shown, caret) = input_window(
            snap.input,
            snap.input_cursor,
            layout[2].width.saturating_sub(2),
        );
        let input_box = Paragraph::new(shown)
            .block(Block::default().borders(Borders::ALL).title(input_title));
        frame.render_widget(Clear, layout[2]);
        frame.render_widget(input_box, layout[2]);

        let caret_x = layout[2].x + 1 + caret;
        frame.set_cursor_position(Position {
            x: caret_x,
            y: layout[2].y + 1,
        });

        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            if snap.busy {
                Span::styled("Working…", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("Idle", Style::default().fg(Color::Green))
            },
            Span::raw(format!(
                " • sources: {} • retained documents: {}",
                snap.sources, snap.documents
            )),
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[3]);
    })?;

    Ok(())
}

/// Tail of `input` to draw in a box `width` columns wide, and the caret
/// column within it. Leading characters scroll off until the caret fits.
fn input_window(input: &str, cursor: usize, width: u16) -> (&str, u16) {
    let room = usize::from(width.saturating_sub(1));
    let head = &input[..cursor];
    let mut before: usize = head.chars().map(|c| c.width().unwrap_or(0)).sum();
    let mut start = 0;
    for (i, ch) in head.char_indices() {
        if before <= room {
            break;
        }
        before = before.saturating_sub(ch.width().unwrap_or(0));
        start = i + ch.len_utf8();
    }
    let caret = u16::try_from(before.min(room)).unwrap_or(0);
    (&input[start..], caret)
}

/// Row range to show for `total` rows when scrolled `scroll` rows up from
/// the bottom. Over-scrolling pins the top row.
fn visible_window(total: usize, height: usize, scroll: usize) -> (usize, usize) {
    let scroll = scroll.min(total.saturating_sub(height));
    let end = total - scroll;
    (end.saturating_sub(height), end)
}

fn wrap_transcript(lines: &[TranscriptLine], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for entry in lines {
        let style = entry.style;
        for raw_line in entry.text.split('\n') {
            if raw_line.is_empty() {
                out.push((String::new(), style));
                continue;
            }
            out.extend(
                wrap(raw_line, effective_width)
                    .into_iter()
                    .map(|seg| (seg.into_owned(), style)),
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_entries_are_split_and_wrapped() {
        let lines = vec![
            TranscriptLine::new("alpha beta\ngamma".into(), Style::default()),
            TranscriptLine::new(String::new(), Style::default()),
            TranscriptLine::new("one two three four".into(), Style::default()),
        ];
        let rows: Vec<String> = wrap_transcript(&lines, 9)
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(rows, ["alpha", "beta", "gamma", "", "one two", "three", "four"]);
    }

    #[test]
    fn window_follows_the_bottom_and_clamps_scroll() {
        assert_eq!(visible_window(100, 10, 0), (90, 100));
        assert_eq!(visible_window(100, 10, 5), (85, 95));
        assert_eq!(visible_window(100, 10, 500), (0, 10));
        assert_eq!(visible_window(4, 10, 3), (0, 4));
    }

    #[test]
    fn caret_counts_display_width() {
        assert_eq!(input_window("ab", 1, 20), ("ab", 1));
        assert_eq!(input_window("日本", "日本".len(), 20), ("日本", 4));
    }

    #[test]
    fn long_input_scrolls_so_the_caret_stays_inside_the_box() {
        assert_eq!(input_window("abcdefghij", 10, 4), ("hij", 3));
        assert_eq!(input_window("abcdefghij", 2, 4), ("abcdefghij", 2));

        let wide = "日本語テキスト";
        assert_eq!(input_window(wide, wide.len(), 5), ("スト", 4));
        assert_eq!(input_window("abc", 3, 0), ("", 0));
    }
}
