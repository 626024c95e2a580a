//! Tuner widget - detected note and how far off it is

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use keyvox::PitchSample;

pub fn render_tuner(frame: &mut Frame, area: Rect, mic_active: bool, pitch: Option<&PitchSample>) {
    let block = Block::default().title(" Tuner ").borders(Borders::ALL);

    let Some(pitch) = pitch.filter(|_| mic_active) else {
        let message = if mic_active { " listening..." } else { " [M] to start" };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    // Centre of the gauge is in tune; each edge is a quarter tone off
    let cents = pitch.cents_deviation.clamp(-50, 50);
    let ratio = (cents + 50) as f64 / 100.0;
    let colour = match cents.abs() {
        0..=5 => Color::Green,
        6..=20 => Color::Yellow,
        _ => Color::Red,
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(colour))
        .ratio(ratio)
        .label(format!(
            "{}  {:+} cents  {:.1} Hz",
            pitch.note_name(),
            pitch.cents_deviation,
            pitch.frequency_hz
        ));

    frame.render_widget(gauge, area);
}
