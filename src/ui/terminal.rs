// Prompter backed by the real terminal: each prompt is a short-lived inline
// ratatui viewport, erased and replaced by a one-line echo once answered.

use super::components::{Footer, INPUT_PREFIX_WIDTH, input_line, prompt_title};
use super::widgets::{EnhancedProgress, ProgressState};
use super::{Notice, ProgressSink, PromptError, Prompter};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize as _;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{
    Frame, Terminal, TerminalOptions, Viewport,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Widget},
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

type InlineBackend = CrosstermBackend<Stdout>;

/// Most list rows shown at once; longer lists scroll
const MAX_VISIBLE_OPTIONS: usize = 10;
const PROGRESS_REDRAW_INTERVAL: Duration = Duration::from_millis(80);
/// Width of the bar kept on screen once an operation ends
const FINAL_BAR_WIDTH: u16 = 24;

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn inline_terminal(height: u16) -> io::Result<Terminal<InlineBackend>> {
    Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )
}

#[derive(Debug, PartialEq, Eq)]
enum Step<T> {
    Continue,
    Done(T),
    Interrupt,
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

trait PromptState {
    type Output;

    fn title(&self) -> &str;
    fn height(&self) -> u16;
    fn draw(&self, frame: &mut Frame);
    fn handle(&mut self, key: KeyEvent) -> Step<Self::Output>;
    /// Text echoed after the prompt is answered
    fn summary(&self, output: &Self::Output) -> String;
}

fn run_prompt<S: PromptState>(state: &mut S) -> Result<S::Output, PromptError> {
    let raw = RawModeGuard::enable()?;
    let mut terminal = inline_terminal(state.height())?;

    let outcome = loop {
        terminal.draw(|frame| state.draw(frame))?;
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle(key) {
                Step::Continue => {}
                Step::Done(value) => break Ok(value),
                Step::Interrupt => break Err(PromptError::Interrupted),
            }
        }
    };

    terminal.clear()?;
    terminal.show_cursor()?;
    drop(raw);

    if let Ok(value) = &outcome {
        println!(
            "{} {} {}",
            "✔".green(),
            state.title().bold(),
            state.summary(value).cyan()
        );
    }
    outcome
}

struct ChoiceState {
    title: String,
    options: Vec<String>,
    selected: usize,
}

impl ChoiceState {
    fn new(title: &str, options: &[String], default: usize) -> Self {
        Self {
            title: title.to_string(),
            options: options.to_vec(),
            selected: default.min(options.len().saturating_sub(1)),
        }
    }
}

impl PromptState for ChoiceState {
    type Output = Option<usize>;

    fn title(&self) -> &str {
        &self.title
    }

    fn height(&self) -> u16 {
        (self.options.len().clamp(1, MAX_VISIBLE_OPTIONS) + 2) as u16
    }

    fn draw(&self, frame: &mut Frame) {
        let [title_area, list_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(Paragraph::new(prompt_title(&self.title)), title_area);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|o| ListItem::new(o.as_str()))
            .collect();
        let list = List::new(items)
            .highlight_symbol("› ")
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        let mut list_state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, list_area, &mut list_state);

        frame.render_widget(Footer::choice(), footer_area);
    }

    fn handle(&mut self, key: KeyEvent) -> Step<Option<usize>> {
        if is_interrupt(&key) {
            return Step::Interrupt;
        }
        let len = self.options.len();
        if len == 0 {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc => Step::Done(None),
                _ => Step::Continue,
            };
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = (self.selected + len - 1) % len;
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1) % len;
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = len - 1,
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < len {
                    self.selected = index;
                }
            }
            KeyCode::Enter => return Step::Done(Some(self.selected)),
            KeyCode::Esc => return Step::Done(None),
            _ => {}
        }
        Step::Continue
    }

    fn summary(&self, output: &Option<usize>) -> String {
        output
            .and_then(|i| self.options.get(i))
            .cloned()
            .unwrap_or_else(|| "(back)".to_string())
    }
}

struct TextState {
    title: String,
    value: String,
}

impl PromptState for TextState {
    type Output = Option<String>;

    fn title(&self) -> &str {
        &self.title
    }

    fn height(&self) -> u16 {
        3
    }

    fn draw(&self, frame: &mut Frame) {
        let [title_area, input_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(Paragraph::new(prompt_title(&self.title)), title_area);
        frame.render_widget(Paragraph::new(input_line(&self.value)), input_area);
        frame.render_widget(Footer::text(), footer_area);

        let column = INPUT_PREFIX_WIDTH.saturating_add(self.value.chars().count() as u16);
        frame.set_cursor_position(Position::new(
            input_area.x + column.min(input_area.width.saturating_sub(1)),
            input_area.y,
        ));
    }

    fn handle(&mut self, key: KeyEvent) -> Step<Option<String>> {
        if is_interrupt(&key) {
            return Step::Interrupt;
        }
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.clear();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.push(c);
            }
            KeyCode::Backspace => {
                self.value.pop();
            }
            KeyCode::Enter => return Step::Done(Some(self.value.clone())),
            KeyCode::Esc => return Step::Done(None),
            _ => {}
        }
        Step::Continue
    }

    fn summary(&self, output: &Option<String>) -> String {
        output.clone().unwrap_or_else(|| "(back)".to_string())
    }
}

struct ConfirmState {
    question: String,
    default: bool,
}

impl PromptState for ConfirmState {
    type Output = bool;

    fn title(&self) -> &str {
        &self.question
    }

    fn height(&self) -> u16 {
        2
    }

    fn draw(&self, frame: &mut Frame) {
        let [question_area, footer_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(frame.area());

        let suffix = if self.default { " (Y/n)" } else { " (y/N)" };
        let mut line = prompt_title(&self.question);
        line.push_span(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
        frame.render_widget(Paragraph::new(line), question_area);
        frame.render_widget(Footer::confirm(self.default), footer_area);
    }

    fn handle(&mut self, key: KeyEvent) -> Step<bool> {
        if is_interrupt(&key) {
            return Step::Interrupt;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Step::Done(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Step::Done(false),
            KeyCode::Enter => Step::Done(self.default),
            _ => Step::Continue,
        }
    }

    fn summary(&self, output: &bool) -> String {
        let answer = if *output { "Yes" } else { "No" };
        answer.to_string()
    }
}

/// Inline progress display: title, bar with percentage, detail line
pub struct TerminalProgress {
    terminal: Terminal<InlineBackend>,
    title: String,
    fraction: Option<f64>,
    detail: String,
    tick: u64,
    last_draw: Option<Instant>,
    finished: bool,
}

impl TerminalProgress {
    fn new(title: &str) -> io::Result<Self> {
        Ok(Self {
            terminal: inline_terminal(3)?,
            title: title.to_string(),
            fraction: None,
            detail: String::new(),
            tick: 0,
            last_draw: None,
            finished: false,
        })
    }

    fn redraw(&mut self, state: ProgressState) -> io::Result<()> {
        let title = self.title.clone();
        let detail = self.detail.clone();
        let fraction = self.fraction;
        let tick = self.tick;

        self.terminal.draw(|frame| {
            let [title_area, bar_row, detail_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());
            let [bar_area, pct_area] =
                Layout::horizontal([Constraint::Min(10), Constraint::Length(7)]).areas(bar_row);

            frame.render_widget(Paragraph::new(Line::from(title.as_str())), title_area);
            frame.render_widget(EnhancedProgress::new(fraction, state).tick(tick), bar_area);
            let pct = match fraction {
                Some(f) => format!("{:>6.1}%", f * 100.0),
                None => String::new(),
            };
            frame.render_widget(Paragraph::new(pct), pct_area);
            frame.render_widget(
                Paragraph::new(detail.as_str()).style(Style::default().fg(Color::Gray)),
                detail_area,
            );
        })?;
        self.last_draw = Some(Instant::now());
        Ok(())
    }

    /// Leave the outcome and the final bar above the prompt, then free the
    /// viewport.
    fn close(&mut self, state: ProgressState, message: &str) {
        if self.finished {
            return;
        }
        self.finished = true;

        let line = outcome_line(state, message);
        let bar = EnhancedProgress::new(self.fraction, state);
        let result = self
            .terminal
            .insert_before(1, |buf| {
                let [text_area, bar_area] = Layout::horizontal([
                    Constraint::Min(10),
                    Constraint::Length(FINAL_BAR_WIDTH),
                ])
                .areas(buf.area);
                Paragraph::new(line).render(text_area, buf);
                bar.render(bar_area, buf);
            })
            .and_then(|()| self.terminal.clear());
        if let Err(e) = result {
            tracing::debug!(error = %e, "could not close progress area");
        }
    }
}

/// Closing line of a progress display: check mark or cross, then the message
fn outcome_line(state: ProgressState, message: &str) -> Line<'static> {
    let mark = match state {
        ProgressState::Failed => Span::styled("✘ ", Style::default().fg(Color::Red)),
        _ => Span::styled("✔ ", Style::default().fg(Color::Green)),
    };
    Line::from(vec![mark, Span::raw(message.to_string())])
}

impl ProgressSink for TerminalProgress {
    fn update(&mut self, fraction: Option<f64>, detail: &str) {
        self.fraction = fraction;
        self.detail.clear();
        self.detail.push_str(detail);
        self.tick = self.tick.wrapping_add(1);

        let due = self
            .last_draw
            .is_none_or(|t| t.elapsed() >= PROGRESS_REDRAW_INTERVAL);
        if due {
            if let Err(e) = self.redraw(ProgressState::Running) {
                tracing::debug!(error = %e, "progress redraw failed");
            }
        }
    }

    fn finish(&mut self, message: &str) {
        self.close(ProgressState::Done, message);
    }

    fn fail(&mut self, message: &str) {
        self.close(ProgressState::Failed, message);
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.terminal.clear();
        }
    }
}

/// The interactive terminal front end
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn ask_choice(
        &mut self,
        title: &str,
        options: &[String],
        default: usize,
    ) -> Result<Option<usize>, PromptError> {
        run_prompt(&mut ChoiceState::new(title, options, default))
    }

    fn ask_text(&mut self, title: &str, initial: &str) -> Result<Option<String>, PromptError> {
        run_prompt(&mut TextState {
            title: title.to_string(),
            value: initial.to_string(),
        })
    }

    fn ask_confirm(&mut self, question: &str, default: bool) -> Result<bool, PromptError> {
        run_prompt(&mut ConfirmState {
            question: question.to_string(),
            default,
        })
    }

    fn notify(&mut self, level: Notice, message: &str) {
        let symbol = match level {
            Notice::Info => "•".cyan(),
            Notice::Success => "✔".green(),
            Notice::Warning => "!".yellow(),
            Notice::Error => "✘".red(),
        };
        println!("{} {}", symbol, message);
    }

    fn show_progress(&mut self, title: &str) -> Result<Box<dyn ProgressSink + '_>, PromptError> {
        Ok(Box::new(TerminalProgress::new(title)?))
    }
}
