// Reusable prompt components

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One-line key hint shown under a prompt
pub struct Footer {
    content: Line<'static>,
}

impl Footer {
    fn from_controls(controls: &[(&'static str, &'static str)]) -> Self {
        let mut spans = Vec::new();

        for (i, (hotkey, desc)) in controls.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(*hotkey, Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(*desc, Style::default().fg(Color::Gray)));
        }

        Self {
            content: Line::from(spans),
        }
    }

    pub fn choice() -> Self {
        Self::from_controls(&[("[↑/↓]", "Move"), ("[Enter]", "Select"), ("[Esc]", "Back")])
    }

    pub fn text() -> Self {
        Self::from_controls(&[("[Enter]", "Accept"), ("[Esc]", "Back")])
    }

    pub fn confirm(default: bool) -> Self {
        let enter = if default { "Yes" } else { "No" };
        Self::from_controls(&[("[Y]", "Yes"), ("[N]", "No"), ("[Enter]", enter)])
    }

    /// Plain text of the hint line
    pub fn text_content(&self) -> String {
        self.content
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect()
    }
}

impl Widget for Footer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.content).render(area, buf);
    }
}

/// "? Title" header line of a prompt
pub fn prompt_title(title: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("? ", Style::default().fg(Color::Green).bold()),
        Span::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// Text entry line with a dimmed placeholder when empty
pub fn input_line(value: &str) -> Line<'static> {
    let mut spans = vec![Span::styled("› ", Style::default().fg(Color::Cyan))];
    if value.is_empty() {
        spans.push(Span::styled("(empty)", Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::raw(value.to_string()));
    }
    Line::from(spans)
}

/// Width of the "› " prefix drawn by [`input_line`]
pub const INPUT_PREFIX_WIDTH: u16 = 2;
