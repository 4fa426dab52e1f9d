//! TUI (Terminal User Interface) module for the Valentine's puzzle
//!
//! Interactive terminal client built on Ratatui. One instance drives one
//! [`PuzzleSession`] through the full phase chain:
//!
//! `Intro` → `Countdown` → `WordPuzzle` → `ThemeQuestion` → `Reveal`
//!
//! with `Failed` as the dead end when the guess budget runs out and a
//! Backspace edge from `Countdown` back to `Intro`. The countdown is
//! recomputed from the wall clock on every loop iteration; the event
//! poll timeout is the tick.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::config::AppConfig;
use crate::countdown::TimeLeft;
use crate::email::{self, ResendMailer};
use crate::feedback::{CellVerdict, TARGET_COUNT, WORD_LENGTH};
use crate::session::{GuessHistoryEntry, Phase, PuzzleSession};
use crate::wordbank::WordBank;
use crate::{debug_log, info_log};

const EVENT_POLL_TIMEOUT_MS: u64 = 100;
const BOARD_ROW_HEIGHT: u16 = 1;
const MAX_ANSWER_LEN: usize = 64;

// Style constants for consistent UI
const HEADER_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);
const SUCCESS_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const COUNTDOWN_STYLE: Style = Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD);
const PROMPT_STYLE: Style = Style::new().fg(Color::Cyan);

/// Everything a single frame needs, collected up front so rendering can
/// borrow the terminal mutably at the same time.
struct RenderContext<'a> {
    phase: Phase,
    time_left: TimeLeft,
    history: &'a [GuessHistoryEntry],
    solved: [bool; TARGET_COUNT],
    attempts_remaining: u32,
    input: &'a str,
    error_message: &'a str,
    status: &'a str,
}

pub struct PuzzleTui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    session: PuzzleSession,
    config: Arc<AppConfig>,
    input: String,
    error_message: String,
    status: String,
    time_left: TimeLeft,
}

/// Run the interactive puzzle until the visitor quits.
pub fn run(config: Arc<AppConfig>, wordbank: Arc<WordBank>) -> io::Result<()> {
    let session = PuzzleSession::new(config.clone(), wordbank)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let mut tui = PuzzleTui::new(config, session)?;
    let result = tui.event_loop();
    tui.cleanup()?;
    result
}

impl PuzzleTui {
    fn new(config: Arc<AppConfig>, session: PuzzleSession) -> io::Result<Self> {
        info_log!("PuzzleTui::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            session,
            config,
            input: String::new(),
            error_message: String::new(),
            status: "We're glad you're starting to find us".to_string(),
            time_left: TimeLeft::default(),
        })
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    fn event_loop(&mut self) -> io::Result<()> {
        loop {
            let was = self.session.phase();
            self.time_left = self.session.tick(Utc::now());
            if was == Phase::Countdown && self.session.phase() == Phase::WordPuzzle {
                info_log!("event_loop() - Countdown gate opened");
                self.status = "It's time. Four words stand between you and your clue".to_string();
            }
            self.draw()?;
            if self.handle_input()? {
                return Ok(());
            }
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let ctx = RenderContext {
            phase: self.session.phase(),
            time_left: self.time_left,
            history: self.session.history(),
            solved: self.session.solved(),
            attempts_remaining: self.session.attempts_remaining(),
            input: &self.input,
            error_message: &self.error_message,
            status: &self.status,
        };
        self.terminal.draw(|f| Self::render(f, &ctx))?;
        Ok(())
    }

    /// Returns `Ok(true)` when the visitor asked to quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if !event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            return Ok(false);
        }
        let key = match event::read()? {
            Event::Key(key) => key,
            other => {
                debug_log!("handle_input() - Ignoring non-key event: {:?}", other);
                return Ok(false);
            }
        };
        // Only process Press events; Release and Repeat would double input
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        // Alt/Ctrl chords come from the terminal, not the puzzle
        if key.modifiers.contains(KeyModifiers::ALT)
            || key.modifiers.contains(KeyModifiers::CONTROL)
        {
            debug_log!("handle_input() - Ignoring modified key: {:?}", key.modifiers);
            return Ok(false);
        }
        if key.code == KeyCode::Esc {
            info_log!("handle_input() - ESC pressed, exiting");
            return Ok(true);
        }
        match self.session.phase() {
            Phase::Intro => self.handle_intro_key(key),
            Phase::Countdown => self.handle_countdown_key(key),
            Phase::WordPuzzle => self.handle_puzzle_key(key),
            Phase::ThemeQuestion => self.handle_theme_key(key),
            Phase::Reveal | Phase::Failed => {}
        }
        Ok(false)
    }

    fn handle_intro_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if is_answer_char(c) && self.input.len() < MAX_ANSWER_LEN => {
                self.error_message.clear();
                self.input.push(c);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let answer = std::mem::take(&mut self.input);
                match self.session.submit_riddle(&answer) {
                    Ok(true) => {
                        info_log!("handle_intro_key() - Riddle solved");
                        self.error_message.clear();
                        self.status = "Riddle solved. The countdown is on".to_string();
                    }
                    Ok(false) => {
                        self.error_message =
                            "That's not it yet. Think it over and try again.".to_string();
                    }
                    Err(e) => {
                        self.error_message = e.to_string();
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_countdown_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Backspace && self.session.back_to_intro() {
            info_log!("handle_countdown_key() - Backed out to intro");
            self.status = "We're glad you're starting to find us".to_string();
        }
    }

    fn handle_puzzle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_alphabetic() && self.input.len() < WORD_LENGTH => {
                self.error_message.clear();
                self.input.push(c.to_ascii_lowercase());
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter if self.input.len() == WORD_LENGTH => {
                let guess = std::mem::take(&mut self.input);
                match self.session.submit_guess(&guess) {
                    Ok(_) => {
                        info_log!("handle_puzzle_key() - Accepted guess '{}'", guess);
                        self.error_message.clear();
                        self.status = match self.session.phase() {
                            Phase::ThemeQuestion => {
                                "All four words found! One last question".to_string()
                            }
                            Phase::Failed => "Out of attempts".to_string(),
                            _ => format!(
                                "Attempts remaining: {}",
                                self.session.attempts_remaining()
                            ),
                        };
                    }
                    Err(e) => {
                        // Rejections cost nothing; put the letters back
                        self.input = guess;
                        self.error_message = e.to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.error_message = "Guess must be exactly 5 letters!".to_string();
            }
            KeyCode::Char(c) if !c.is_ascii_alphabetic() => {
                self.error_message = format!("Only letters are allowed! ('{c}' is not a letter)");
            }
            _ => {}
        }
    }

    fn handle_theme_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if is_answer_char(c) && self.input.len() < MAX_ANSWER_LEN => {
                self.error_message.clear();
                self.input.push(c);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let answer = std::mem::take(&mut self.input);
                if self.session.submit_theme(&answer) {
                    info_log!("handle_theme_key() - Theme answered, revealing");
                    self.error_message.clear();
                    self.status = "Happy Valentine's Day".to_string();
                    self.dispatch_notification();
                } else {
                    self.error_message = "Not quite. One more look at the clues.".to_string();
                }
            }
            _ => {}
        }
    }

    /// Fire-and-forget: the send runs on its own thread with its own
    /// runtime, and the outcome is only ever logged.
    fn dispatch_notification(&mut self) {
        if !self.session.take_notification() {
            return;
        }
        let config = self.config.clone();
        thread::spawn(move || {
            let Some(api_key) = config.resend_api_key.clone() else {
                debug_log!("dispatch_notification() - No API key, skipping send");
                return;
            };
            if config.success_recipients.is_empty() {
                debug_log!("dispatch_notification() - No recipients, skipping send");
                return;
            }
            let mailer = ResendMailer::new(api_key);
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    debug_log!("dispatch_notification() - Runtime error: {}", e);
                    return;
                }
            };
            match runtime.block_on(email::send_solved_notification(
                &config,
                &mailer,
                Utc::now(),
            )) {
                Ok(sent) => info_log!("dispatch_notification() - Sent to {} recipients", sent),
                Err(e) => debug_log!("dispatch_notification() - Send failed: {}", e),
            }
        });
    }

    // Rendering

    fn render(f: &mut Frame, ctx: &RenderContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(12),   // Phase content
                Constraint::Length(3), // Status line
                Constraint::Length(3), // Instructions
            ])
            .split(f.area());

        Self::render_title(f, chunks[0], ctx.phase);
        match ctx.phase {
            Phase::Intro => Self::render_intro(f, chunks[1], ctx),
            Phase::Countdown => Self::render_countdown(f, chunks[1], ctx),
            Phase::WordPuzzle => Self::render_puzzle(f, chunks[1], ctx),
            Phase::ThemeQuestion => Self::render_theme(f, chunks[1], ctx),
            Phase::Reveal => Self::render_reveal(f, chunks[1]),
            Phase::Failed => Self::render_failed(f, chunks[1]),
        }
        Self::render_status(f, chunks[2], ctx);
        Self::render_instructions(f, chunks[3], ctx.phase);
    }

    fn render_title(f: &mut Frame, area: Rect, phase: Phase) {
        let heading = match phase {
            Phase::Intro => "♥ HEY NEILLL ♥",
            Phase::Countdown => "♥ THE WAIT IS PART OF THE MYSTERY ♥",
            Phase::WordPuzzle => "♥ FOUR WORDS ♥",
            Phase::ThemeQuestion => "♥ ONE LAST QUESTION ♥",
            Phase::Reveal => "♥ HAPPY VALENTINE'S DAY ♥",
            Phase::Failed => "♥ OUT OF GUESSES ♥",
        };
        let title = Paragraph::new(heading)
            .style(HEADER_STYLE)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn render_intro(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let mut lines = vec![
            Line::from(""),
            Line::from("We're glad you're starting to find us."),
            Line::from(""),
            Line::from(Span::styled(
                "Answer the riddle you were given to begin:",
                PROMPT_STYLE,
            )),
            Line::from(""),
            Line::from(format!("> {}_", ctx.input)),
        ];
        push_error_line(&mut lines, ctx.error_message);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_countdown(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let t = ctx.time_left;
        let digits = format!(
            "{:02} : {:02} : {:02} : {:02}",
            t.days, t.hours, t.minutes, t.seconds
        );
        let lines = vec![
            Line::from(""),
            Line::from("Your first clue arrives at midnight."),
            Line::from("When Valentine's Day begins, get ready."),
            Line::from(""),
            Line::from(Span::styled(
                "TIME UNTIL YOUR CLUE UNLOCKS",
                PROMPT_STYLE,
            )),
            Line::from(""),
            Line::from(Span::styled(digits, COUNTDOWN_STYLE)),
            Line::from("DAYS   HOURS  MINS   SECS"),
            Line::from(""),
            Line::from("Midnight, February 14th"),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_puzzle(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let outer = Block::default()
            .title("Find all four words")
            .borders(Borders::ALL);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let board_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, TARGET_COUNT as u32); TARGET_COUNT])
            .split(inner);
        for board in 0..TARGET_COUNT {
            Self::render_board(f, board_chunks[board], ctx, board);
        }
    }

    fn render_board(f: &mut Frame, area: Rect, ctx: &RenderContext, board: usize) {
        let title = if ctx.solved[board] {
            format!("Word {} ✓", board + 1)
        } else {
            format!("Word {}", board + 1)
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut y = inner.y;
        for entry in ctx.history {
            if y >= inner.y + inner.height {
                return;
            }
            let spans = guess_row_spans(&entry.guess, &entry.feedback[board]);
            render_line_at(f, inner, y, spans);
            y += BOARD_ROW_HEIGHT;
        }
        // Current input row; solved boards stop echoing it
        if !ctx.solved[board] && y < inner.y + inner.height {
            let spans = input_row_spans(ctx.input);
            render_line_at(f, inner, y, spans);
        }
    }

    fn render_theme(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let mut lines = vec![
            Line::from(""),
            Line::from("You found all four words. One more thing:"),
            Line::from(""),
            Line::from(Span::styled(
                "What little creature has been buzzing through all of this?",
                PROMPT_STYLE,
            )),
            Line::from(""),
            Line::from(format!("> {}_", ctx.input)),
        ];
        push_error_line(&mut lines, ctx.error_message);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_reveal(f: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("  .:::.   .:::.  ", ERROR_STYLE)),
            Line::from(Span::styled(" :::::::.::::::: ", ERROR_STYLE)),
            Line::from(Span::styled(" ::::::::::::::: ", ERROR_STYLE)),
            Line::from(Span::styled("  ':::::::::::'  ", ERROR_STYLE)),
            Line::from(Span::styled("    ':::::::'    ", ERROR_STYLE)),
            Line::from(Span::styled("      ':::'      ", ERROR_STYLE)),
            Line::from(""),
            Line::from(Span::styled(
                "You found us. The first hint is yours.",
                SUCCESS_STYLE,
            )),
            Line::from(""),
            Line::from("Happy Valentine's Day, Neil ❤"),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_failed(f: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "The words keep their secret this time.",
                ERROR_STYLE,
            )),
            Line::from(""),
            Line::from("Come back and start over; they'll still be waiting."),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let text = if ctx.phase == Phase::WordPuzzle {
            format!(
                "{}  |  Attempts remaining: {}",
                ctx.status, ctx.attempts_remaining
            )
        } else {
            ctx.status.to_string()
        };
        let paragraph = Paragraph::new(text)
            .style(PROMPT_STYLE)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(paragraph, area);
    }

    fn render_instructions(f: &mut Frame, area: Rect, phase: Phase) {
        let text = match phase {
            Phase::Intro | Phase::ThemeQuestion => {
                "Type your answer | ENTER: Submit | ESC: Quit"
            }
            Phase::Countdown => "BACKSPACE: Back | ESC: Quit",
            Phase::WordPuzzle => "Type your 5-letter guess | ENTER: Submit | ESC: Quit",
            Phase::Reveal | Phase::Failed => "ESC: Quit",
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

impl Drop for PuzzleTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn is_answer_char(c: char) -> bool {
    c.is_ascii_graphic() || c == ' '
}

fn push_error_line(lines: &mut Vec<Line<'static>>, error: &str) {
    if !error.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.to_string(), ERROR_STYLE)));
    }
}

fn verdict_colors(verdict: CellVerdict) -> (Color, Color) {
    match verdict {
        CellVerdict::Correct => (Color::Green, Color::Black),
        CellVerdict::Present => (Color::Yellow, Color::Black),
        CellVerdict::Absent => (Color::DarkGray, Color::White),
    }
}

fn guess_row_spans(guess: &str, verdicts: &[CellVerdict; WORD_LENGTH]) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(" ")];
    for (i, letter) in guess.chars().take(WORD_LENGTH).enumerate() {
        let (bg, fg) = verdict_colors(verdicts[i]);
        spans.push(Span::styled(
            format!("{}", letter.to_ascii_uppercase()),
            Style::default().fg(fg).bg(bg),
        ));
        spans.push(Span::raw(" "));
    }
    spans
}

fn input_row_spans(input: &str) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(" ")];
    for i in 0..WORD_LENGTH {
        let letter = input.chars().nth(i).unwrap_or('·');
        spans.push(Span::styled(
            format!("{}", letter.to_ascii_uppercase()),
            Style::default().fg(Color::White).bg(Color::Black),
        ));
        spans.push(Span::raw(" "));
    }
    spans
}

fn render_line_at(f: &mut Frame, area: Rect, y: u16, spans: Vec<Span<'static>>) {
    let paragraph = Paragraph::new(Line::from(spans));
    f.render_widget(
        paragraph,
        Rect {
            x: area.x,
            y,
            width: area.width,
            height: 1,
        },
    );
}
