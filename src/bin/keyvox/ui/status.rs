//! Status bar - preset, timbre, sample rate and the latest message

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::View;

pub fn render_status(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" keyvox ").borders(Borders::ALL);

    let rate = match view.sample_rate {
        Some(sr) => format!("{:.1}kHz  ", sr / 1000.0),
        None => "audio off  ".into(),
    };
    let preset = view.preset.map_or("Custom", |p| p.name());

    let line = Line::from(vec![
        Span::styled(format!(" {preset}  "), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{:?}  ", view.osc_type),
            Style::default().fg(Color::White),
        ),
        Span::styled(rate, Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("voices: {}  ", view.held.len()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(view.status.as_str(), Style::default().fg(Color::Magenta)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
