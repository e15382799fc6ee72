mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::info;
use qclock::{
    analytics::{Correctness, Difficulty, ReviewSheet, SessionReport},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, SessionConfig},
    export,
    question::{QuestionId, QuestionStatus},
    registry::Transition,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{SessionController, SessionSnapshot},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};

/// practice-test timer with per-question tracking and post-session analytics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A practice-test timer that tracks time per question, lets you pause, skip and come back, and breaks the session down afterwards."
)]
pub struct Cli {
    /// number of questions in the session
    #[clap(short = 'q', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    questions: u32,

    /// ideal minutes per question, used to size the session budget
    #[clap(short = 'm', long)]
    ideal_minutes: Option<u32>,

    /// seconds after which a question is flagged for review
    #[clap(short = 'l', long)]
    long_threshold_secs: Option<u64>,

    /// time distribution bucket bounds in seconds, e.g. 60,120,180
    #[clap(long, value_delimiter = ',')]
    buckets: Option<Vec<u64>>,

    /// directory for csv exports
    #[clap(short = 'o', long)]
    export_dir: Option<PathBuf>,

    /// persist the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command line values on the stored configuration
    fn merge_config(&self, stored: SessionConfig) -> SessionConfig {
        SessionConfig {
            ideal_minutes_per_question: self
                .ideal_minutes
                .unwrap_or(stored.ideal_minutes_per_question),
            long_question_threshold_secs: self
                .long_threshold_secs
                .unwrap_or(stored.long_question_threshold_secs),
            bucket_bounds_secs: self.buckets.clone().unwrap_or(stored.bucket_bounds_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Session,
    Analytics,
}

#[derive(Debug)]
enum ExitType {
    Quit,
}

/// Results of a finished session plus the review cursor
#[derive(Debug)]
pub struct AnalyticsState {
    pub snapshot: SessionSnapshot,
    pub report: SessionReport,
    pub review: ReviewSheet,
    pub cursor: usize,
}

impl AnalyticsState {
    fn new(snapshot: SessionSnapshot) -> Self {
        let report = SessionReport::build(&snapshot);
        Self {
            snapshot,
            report,
            review: ReviewSheet::new(),
            cursor: 0,
        }
    }

    pub fn selected(&self) -> Option<QuestionId> {
        self.report.long_questions.get(self.cursor).copied()
    }
}

#[derive(Debug)]
pub struct App {
    pub session: SessionController,
    pub state: AppState,
    pub selected: usize,
    pub analytics: Option<AnalyticsState>,
    pub status_line: Option<String>,
    pub export_dir: PathBuf,
    question_count: usize,
}

impl App {
    pub fn new(question_count: usize, config: SessionConfig, export_dir: PathBuf) -> Self {
        Self {
            session: SessionController::with_system_clock(question_count, config),
            state: AppState::Session,
            selected: 0,
            analytics: None,
            status_line: None,
            export_dir,
            question_count,
        }
    }

    /// Discard the current session and start over with the same settings
    pub fn restart(&mut self) {
        self.session.leave_view();
        let config = self.session.config().clone();
        *self = Self::new(self.question_count, config, self.export_dir.clone());
        info!("session restarted");
    }

    pub fn selected_id(&self) -> QuestionId {
        QuestionId(self.selected as u32 + 1)
    }

    /// Advance the session clock. Returns whether anything changed on screen.
    pub fn on_tick(&mut self) -> bool {
        self.state == AppState::Session && self.session.tick().is_some()
    }

    fn change_selected(&mut self, status: QuestionStatus) {
        let id = self.selected_id();
        self.status_line = match self.session.request_status_change(id, status) {
            Transition::Applied {
                demoted: Some(prev),
                ..
            } => Some(format!("{prev} paused, {id} active")),
            Transition::Applied { .. } => None,
            Transition::Ignored(reason) => Some(format!("{id}: {reason}")),
        };
    }

    /// Skip or complete the selection, then move on to the next unfinished
    /// question. A question has to be started before it can be left.
    fn leave_selected(&mut self, status: QuestionStatus) {
        let id = self.selected_id();
        let not_started = self
            .session
            .record(id)
            .is_some_and(|r| r.status == QuestionStatus::NotStarted);
        if not_started {
            self.status_line = Some(format!("start {id} before marking it {status}"));
            return;
        }

        self.change_selected(status);
        if let Some(next) = self.session.next_unfinished_after(id) {
            self.selected = next.0 as usize - 1;
        }
    }

    pub fn finish(&mut self) {
        self.session.finish_session();
        self.analytics = Some(AnalyticsState::new(self.session.snapshot()));
        self.state = AppState::Analytics;
        self.status_line = None;
    }

    fn on_session_key(&mut self, key: KeyEvent) {
        let last = self.session.question_count().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            KeyCode::Enter | KeyCode::Char(' ') => self.change_selected(QuestionStatus::Active),
            KeyCode::Char('p') => {
                let active = self
                    .session
                    .record(self.selected_id())
                    .is_some_and(|r| r.is_active());
                if active {
                    self.change_selected(QuestionStatus::Paused);
                }
            }
            KeyCode::Char('s') => self.leave_selected(QuestionStatus::Skipped),
            KeyCode::Char('c') => self.leave_selected(QuestionStatus::Completed),
            KeyCode::Char('g') => self.session.toggle_global_clock(),
            KeyCode::Char('f') => self.finish(),
            _ => {}
        }
    }

    fn on_analytics_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('r') {
            self.restart();
            return;
        }
        let Some(analytics) = self.analytics.as_mut() else {
            return;
        };
        let selected = analytics.selected();
        match (key.code, selected) {
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                analytics.cursor = analytics.cursor.saturating_sub(1)
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                let last = analytics.report.long_questions.len().saturating_sub(1);
                analytics.cursor = (analytics.cursor + 1).min(last);
            }
            (KeyCode::Char('y'), Some(id)) => {
                analytics.review.set_correctness(id, Correctness::Correct)
            }
            (KeyCode::Char('x'), Some(id)) => {
                analytics.review.set_correctness(id, Correctness::Incorrect)
            }
            (KeyCode::Char('1'), Some(id)) => analytics.review.set_difficulty(id, Difficulty::Easy),
            (KeyCode::Char('2'), Some(id)) => {
                analytics.review.set_difficulty(id, Difficulty::Medium)
            }
            (KeyCode::Char('3'), Some(id)) => analytics.review.set_difficulty(id, Difficulty::Hard),
            (KeyCode::Char('u'), Some(id)) => analytics.review.clear(id),
            (KeyCode::Char('e'), _) => {
                self.status_line = Some(
                    match export::export_to_dir(
                        &self.export_dir,
                        &analytics.snapshot,
                        &analytics.review,
                    ) {
                        Ok(path) => format!("exported to {}", path.display()),
                        Err(e) => format!("export failed: {e}"),
                    },
                );
            }
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Option<ExitType> {
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if key.code == KeyCode::Esc || ctrl_c {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Session => self.on_session_key(key),
            AppState::Analytics => self.on_analytics_key(key),
        }
        None
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = cli.merge_config(store.load());
    if let Err(e) = config.validate() {
        Cli::command().error(ErrorKind::ValueValidation, e).exit();
    }
    if cli.save_config {
        store.save(&config)?;
        info!("saved settings to {}", store.path().display());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let export_dir = cli.export_dir.clone().unwrap_or_else(AppDirs::export_dir);
    let mut app = App::new(cli.questions as usize, config, export_dir);
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if let Some(ExitType::Quit) = app.on_key(key) {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    // no ticks may reach the session once the view is gone
    app.session.leave_view();
    Ok(())
}
