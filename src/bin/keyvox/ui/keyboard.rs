//! Keyboard widget - the playable keys, lit while their note sounds

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::super::keymap::{is_black, KEYS};

pub fn render_keyboard(frame: &mut Frame, area: Rect, held: &[u8]) {
    let block = Block::default().title(" Keys ").borders(Borders::ALL);

    // Black row is shifted so its caps straddle two white caps
    let mut black = vec![Span::raw("  ")];
    let mut white = vec![Span::raw(" ")];
    for &(key, note) in &KEYS {
        let lit = held.contains(&note);
        let style = match (lit, is_black(note)) {
            (true, _) => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            (false, true) => Style::default().fg(Color::White).bg(Color::DarkGray),
            (false, false) => Style::default().fg(Color::Black).bg(Color::White),
        };
        let cap = Span::styled(format!(" {} ", key.to_ascii_uppercase()), style);

        // Every white key owns the black-row slot to its right
        if is_black(note) {
            black.pop();
            black.push(cap);
        } else {
            black.push(Span::raw("   "));
            white.push(cap);
        }
    }

    let paragraph = Paragraph::new(vec![Line::from(black), Line::from(white)]).block(block);
    frame.render_widget(paragraph, area);
}
