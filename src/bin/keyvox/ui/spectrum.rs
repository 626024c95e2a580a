//! Spectrum widget
//!
//! Byte magnitudes straight from the engine's analyser, one bar per bin.
//! Bins are linear in frequency, so the interesting part sits on the left.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Sparkline},
    Frame,
};

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[u8]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);
    let bars = fit_bins(spectrum, block.inner(area).width as usize);

    let sparkline = Sparkline::default()
        .block(block)
        .data(&bars)
        .max(u8::MAX as u64)
        .style(Style::default().fg(Color::Green));

    frame.render_widget(sparkline, area);
}

/// Squeeze `bins` into `width` columns by taking the loudest bin per column.
fn fit_bins(bins: &[u8], width: usize) -> Vec<u64> {
    if width == 0 || bins.len() <= width {
        return bins.iter().map(|&b| b as u64).collect();
    }
    let per_column = bins.len().div_ceil(width);
    bins.chunks(per_column)
        .map(|chunk| chunk.iter().copied().max().unwrap_or(0) as u64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_peaks() {
        let mut bins = vec![0u8; 128];
        bins[40] = 200;
        let bars = fit_bins(&bins, 32);
        assert_eq!(bars.len(), 32);
        assert_eq!(bars[10], 200);
        assert_eq!(fit_bins(&bins[..8], 32).len(), 8);
    }
}
