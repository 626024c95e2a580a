//! TUI module for keyvox
//!
//! One frame: status bar, spectrum, tuner, keyboard, help line.

mod keyboard;
mod spectrum;
mod status;
mod tuner;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use super::app::View;

use keyboard::render_keyboard;
use spectrum::render_spectrum;
use status::render_status;
use tuner::render_tuner;

pub fn render(frame: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(8),    // Spectrum
            Constraint::Length(3), // Tuner
            Constraint::Length(5), // Keyboard
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status(frame, chunks[0], view);
    render_spectrum(frame, chunks[1], &view.spectrum);
    render_tuner(frame, chunks[2], view.mic_active, view.pitch.as_ref());
    render_keyboard(frame, chunks[3], &view.held);

    let help = Paragraph::new(
        " [a-;] Play  [1-4] Preset  [V] Vocal  [M] Mic  [Q] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}
