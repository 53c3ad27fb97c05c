pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kwiz::{
    bank::{BankError, LoadOptions, QuestionBank, SizeRule},
    config::{Config, ConfigStore, FileConfigStore, Scoring, Theme},
    input::{command_for, Command},
    logging::init_file_logger,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    session::{AnswerState, QuizSession, SessionError, SessionEvent, SessionPhase},
};
use log::{error, info, warn, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// timed multiple-choice quiz in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed multiple-choice quiz TUI. Each round shuffles questions from a JSON question bank, gives you a countdown per question, and reveals the answer with an explanation."
)]
pub struct Cli {
    /// question bank JSON file (defaults to the bundled bank)
    #[clap(short = 'b', long)]
    bank: Option<PathBuf>,

    /// number of questions per round
    #[clap(short = 'n', long)]
    round_size: Option<usize>,

    /// seconds allowed per question
    #[clap(short = 's', long)]
    secs_per_question: Option<u64>,

    /// scoring mode
    #[clap(long, value_enum)]
    scoring: Option<Scoring>,

    /// require the bank to contain exactly this many questions
    #[clap(long, conflicts_with = "min_count")]
    exact_count: Option<usize>,

    /// require the bank to contain at least this many questions
    #[clap(long)]
    min_count: Option<usize>,

    /// colour theme for this run
    #[clap(long, value_enum)]
    theme: Option<Theme>,

    /// start with sound off
    #[clap(long)]
    mute: bool,

    /// write debug-level logs
    #[clap(long)]
    debug: bool,
}

impl Cli {
    /// Layer command line overrides on top of the persisted config
    fn apply(&self, cfg: &Config) -> Config {
        let mut effective = cfg.clone();
        if let Some(ref bank) = self.bank {
            effective.bank_path = Some(bank.clone());
        }
        if let Some(n) = self.round_size {
            effective.round_size = n;
        }
        if let Some(s) = self.secs_per_question {
            effective.secs_per_question = s;
        }
        if let Some(scoring) = self.scoring {
            effective.scoring = scoring;
        }
        if let Some(theme) = self.theme {
            effective.theme = theme;
        }
        if self.mute {
            effective.sound = false;
        }
        effective
    }

    fn load_options(&self) -> LoadOptions {
        let size = match (self.exact_count, self.min_count) {
            (Some(n), _) => SizeRule::Exact(n),
            (None, Some(n)) => SizeRule::AtLeast(n),
            (None, None) => LoadOptions::default().size,
        };
        LoadOptions {
            size,
            require_ids: false,
        }
    }
}

fn load_bank(cfg: &Config, options: LoadOptions) -> Result<QuestionBank, BankError> {
    match cfg.bank_path {
        Some(ref path) => {
            info!("loading question bank from {}", path.display());
            QuestionBank::from_path(path, options)
        }
        None => QuestionBank::bundled(options),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Ready,
    Quiz,
    Results,
    /// Bank could not be loaded; nothing to do but quit
    LoadFailed(String),
}

pub struct App {
    pub session: Option<QuizSession>,
    pub state: AppState,
    pub theme: Theme,
    pub sound: bool,
    stored: Config,
    store: Option<Box<dyn ConfigStore>>,
}

impl App {
    pub fn new(bank: Result<QuestionBank, BankError>, effective: &Config) -> Self {
        let (session, state) = match bank {
            Ok(bank) => (
                Some(QuizSession::new(
                    Arc::new(bank),
                    effective.session_settings(),
                )),
                AppState::Ready,
            ),
            Err(e) => {
                error!("question bank failed to load: {e}");
                (None, AppState::LoadFailed(e.to_string()))
            }
        };

        Self {
            session,
            state,
            theme: effective.theme,
            sound: effective.sound,
            stored: effective.clone(),
            store: None,
        }
    }

    /// Persist theme and sound toggles through `store`, starting from `stored`
    pub fn with_store(mut self, store: Box<dyn ConfigStore>, stored: Config) -> Self {
        self.store = Some(store);
        self.stored = stored;
        self
    }

    /// Apply a command. Returns false when the app should quit.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::ToggleTheme => {
                self.theme = self.theme.toggled();
                self.stored.theme = self.theme;
                self.persist();
            }
            Command::ToggleSound => {
                self.sound = !self.sound;
                self.stored.sound = self.sound;
                self.persist();
            }
            Command::Restart => self.start_round(),
            Command::Next => match self.state {
                AppState::Ready | AppState::Results => self.start_round(),
                AppState::Quiz => self.advance(),
                AppState::LoadFailed(_) => {}
            },
            Command::Select(slot) => {
                if self.state == AppState::Quiz {
                    if let Some(session) = self.session.as_mut() {
                        match session.select_answer(slot) {
                            Ok(_) | Err(SessionError::AlreadyAnswered) => {}
                            Err(e) => warn!("answer ignored: {e}"),
                        }
                    }
                }
            }
        }
        true
    }

    fn start_round(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.restart();
            self.state = if session.is_finished() {
                AppState::Results
            } else {
                AppState::Quiz
            };
        }
    }

    fn advance(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // only advance once the answer is on screen
        if session.answer_state() != AnswerState::Revealed {
            return;
        }
        if let Ok(phase) = session.advance() {
            if phase == SessionPhase::Finished {
                self.state = AppState::Results;
            }
        }
    }

    /// Forward elapsed time to the running question. Returns true when a redraw is due.
    pub fn on_tick(&mut self, elapsed: Duration) -> bool {
        if self.state != AppState::Quiz {
            return false;
        }
        match self.session.as_mut() {
            Some(session) => {
                session.on_tick(elapsed);
                true
            }
            None => false,
        }
    }

    /// Events worth an audible cue, given the sound preference
    pub fn take_cues(&mut self) -> Vec<SessionEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let events = session.drain_events();
        if !self.sound {
            return Vec::new();
        }
        events
            .into_iter()
            .filter(|e| *e != SessionEvent::Click)
            .collect()
    }

    fn persist(&self) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save(&self.stored) {
                warn!("could not save preferences: {e}");
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // logging is best effort; the quiz runs without it
    let _ = init_file_logger(level);

    let store = FileConfigStore::new();
    let stored = store.load();
    let effective = cli.apply(&stored);
    let bank = load_bank(&effective, cli.load_options());
    let mut app = App::new(bank, &effective).with_store(Box::new(store), stored);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        let redraw = match runner.step() {
            QuizEvent::Tick(elapsed) => app.on_tick(elapsed),
            QuizEvent::Resize => true,
            QuizEvent::Key(key) => match command_for(key) {
                Some(command) => {
                    if !app.handle(command) {
                        break;
                    }
                    true
                }
                None => false,
            },
        };

        if !app.take_cues().is_empty() {
            ring_bell();
        }

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ring_bell() {
    let mut out = io::stdout();
    let _ = out.write_all(b"\x07").and_then(|_| out.flush());
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
