//! Stepped Unicode volume gauge.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::VolumeGauge;
use crate::theme::{style_muted, style_playing, style_secondary};

const STEPS: [char; 7] = ['▁', '▂', '▃', '▅', '▆', '▇', '█'];

/// Number of lit steps for `percent` (0..=100, larger values saturate).
pub fn lit_steps(percent: u16) -> usize {
    let percent = percent.min(100) as usize;
    (percent * STEPS.len()).div_ceil(100)
}

/// Render the gauge right-aligned in `area`; nothing when hidden.
pub fn draw_volume(frame: &mut Frame, area: Rect, gauge: &VolumeGauge) {
    if !gauge.visible || area.width == 0 || area.height == 0 {
        return;
    }

    let lit = lit_steps(gauge.percent);
    let on: String = STEPS[..lit].iter().collect();
    let off: String = STEPS[lit..].iter().collect();

    let line = Line::from(vec![
        Span::styled("vol ", style_secondary()),
        Span::styled(on, style_playing()),
        Span::styled(off, style_muted()),
        Span::styled(format!(" {:>3}%", gauge.percent), style_secondary()),
    ])
    .right_aligned();

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_steps() {
        assert_eq!(lit_steps(0), 0);
        assert_eq!(lit_steps(1), 1);
        assert_eq!(lit_steps(50), 4);
        assert_eq!(lit_steps(100), STEPS.len());
        assert_eq!(lit_steps(250), STEPS.len());
    }
}
