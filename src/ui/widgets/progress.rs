// Progress bar with determinate and indeterminate states

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Width of the moving block shown when the total is unknown
const INDETERMINATE_SPAN: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Running,
    Done,
    Failed,
}

pub struct EnhancedProgress {
    /// `None` renders the indeterminate animation
    percent: Option<u16>,
    state: ProgressState,
    tick: u64,
}

impl EnhancedProgress {
    pub fn new(fraction: Option<f64>, state: ProgressState) -> Self {
        Self {
            percent: fraction.map(|f| (f.clamp(0.0, 1.0) * 100.0).round() as u16),
            state,
            tick: 0,
        }
    }

    /// Animation frame counter for the indeterminate state
    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    fn filled_range(&self, width: u16) -> (u16, u16) {
        match (self.state, self.percent) {
            (ProgressState::Done, _) => (0, width),
            (_, Some(percent)) => {
                let filled = (width as f64 * percent as f64 / 100.0).round() as u16;
                (0, filled.min(width))
            }
            (_, None) => {
                let span = INDETERMINATE_SPAN.min(width);
                let travel = width.saturating_sub(span).max(1) as u64;
                // Bounce back and forth across the bar
                let step = self.tick % (travel * 2);
                let start = if step < travel { step } else { travel * 2 - step };
                let start = (start as u16).min(width.saturating_sub(span));
                (start, start + span)
            }
        }
    }
}

impl Widget for EnhancedProgress {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (start, end) = self.filled_range(area.width);

        let filled_fg = match self.state {
            ProgressState::Running => Color::Cyan,
            ProgressState::Done => Color::Green,
            ProgressState::Failed => Color::Red,
        };

        for x in 0..area.width {
            let (symbol, style) = if x >= start && x < end {
                ("█", Style::default().fg(filled_fg))
            } else {
                ("░", Style::default().fg(Color::DarkGray))
            };
            buf.set_string(area.x + x, area.y, symbol, style);
        }
    }
}
