mod ui;

use examify::{
    app_dirs::AppDirs,
    catalog::Catalog,
    config::{Config, ConfigStore, FileConfigStore},
    error::{ExamError, LoadError},
    exam::{ExamSession, SessionTick},
    ledger::Answer,
    loader::load_json,
    question::{Question, QuestionKind},
    runtime::{CrosstermEventSource, ExamEvent, FixedTicker, Runner},
    scoring::{QuestionOutcome, ResultRecord, DEFAULT_PAGE_SIZE},
    session::{SessionConfig, SessionStatus},
    store::{ResultStore, SqliteResultStore},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
};
use webbrowser::Browser;

/// timed practice exams with per-question review and domain scores
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take timed practice exams in the terminal. Each question has its own countdown on top of the total exam timer; results with timing analytics and domain scores are kept for review."
)]
pub struct Cli {
    /// bundled exam to take (see --list)
    #[clap(short = 'e', long)]
    exam: Option<String>,

    /// JSON file of questions to use instead of a bundled exam
    #[clap(short = 'q', long)]
    questions: Option<PathBuf>,

    /// total exam time in seconds
    #[clap(short = 't', long)]
    total_secs: Option<u64>,

    /// time budget per question in seconds
    #[clap(short = 's', long)]
    question_secs: Option<u64>,

    /// list bundled exams and exit
    #[clap(long)]
    list: bool,

    /// print the last stored result as JSON and exit
    #[clap(long)]
    last: bool,

    /// store the effective exam and timer settings as the new defaults
    #[clap(long)]
    save_defaults: bool,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(exam) = &self.exam {
            config.exam_type = exam.clone();
        }
        if let Some(secs) = self.total_secs {
            config.total_exam_seconds = secs;
        }
        if let Some(secs) = self.question_secs {
            config.per_question_seconds = secs;
        }
        config
    }
}

/// Everything the app needs to (re)build a session
#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub session: SessionConfig,
    pub pass_mark: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Intro,
    Exam,
    Results,
    Review,
    QuestionReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Cursor and pending choices for the question on screen
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    pub cursor: usize,
    /// option indices picked for single and multiple choice
    pub chosen: BTreeSet<usize>,
    /// task index -> option index for matching
    pub assignments: BTreeMap<usize, usize>,
}

impl Selection {
    fn rows(question: &Question) -> usize {
        match question.kind {
            QuestionKind::Matching { ref tasks } => tasks.len(),
            _ => question.options.len(),
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, question: &Question) {
        if self.cursor + 1 < Self::rows(question) {
            self.cursor += 1;
        }
    }

    /// Pick the option under the cursor; toggles for multiple choice
    pub fn toggle(&mut self, question: &Question) {
        match question.kind {
            QuestionKind::SingleChoice { .. } => {
                self.chosen.clear();
                self.chosen.insert(self.cursor);
            }
            QuestionKind::MultipleChoice { .. } => {
                if !self.chosen.remove(&self.cursor) {
                    self.chosen.insert(self.cursor);
                }
            }
            QuestionKind::Matching { .. } => self.cycle(question, true),
        }
    }

    /// Step the option assigned to the task under the cursor
    pub fn cycle(&mut self, question: &Question, forward: bool) {
        let count = question.options.len();
        if count == 0 || Self::rows(question) == 0 {
            return;
        }
        let next = match (self.assignments.get(&self.cursor), forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(&i), true) => (i + 1) % count,
            (Some(&i), false) => (i + count - 1) % count,
        };
        self.assignments.insert(self.cursor, next);
    }

    /// The answer these choices amount to, if complete enough to submit
    pub fn answer(&self, question: &Question) -> Option<Answer> {
        let option_id = |i: &usize| question.options.get(*i).map(|o| o.id.clone());

        match &question.kind {
            QuestionKind::SingleChoice { .. } => self
                .chosen
                .iter()
                .next()
                .and_then(option_id)
                .map(Answer::Single),
            QuestionKind::MultipleChoice { .. } if self.chosen.is_empty() => None,
            QuestionKind::MultipleChoice { .. } => Some(Answer::Multiple(
                self.chosen.iter().filter_map(option_id).collect(),
            )),
            QuestionKind::Matching { tasks } => {
                if self.assignments.len() < tasks.len() {
                    return None;
                }
                tasks
                    .iter()
                    .enumerate()
                    .map(|(t, task)| {
                        self.assignments
                            .get(&t)
                            .and_then(option_id)
                            .map(|o| (task.id.clone(), o))
                    })
                    .collect::<Option<BTreeMap<String, String>>>()
                    .map(Answer::Matching)
            }
        }
    }
}

pub struct App {
    pub settings: Settings,
    pub questions: Vec<Question>,
    pub session: ExamSession,
    pub state: AppState,
    pub selection: Selection,
    /// index into the reviewed outcomes; the page follows from it
    pub review_cursor: usize,
    pub notice: Option<String>,
    pub store: Box<dyn ResultStore>,
}

impl App {
    pub fn new(
        settings: Settings,
        questions: Vec<Question>,
        store: Box<dyn ResultStore>,
    ) -> Result<Self, LoadError> {
        let session = ExamSession::new(settings.session.clone(), questions.clone())?;
        Ok(Self {
            settings,
            questions,
            session,
            state: AppState::Intro,
            selection: Selection::default(),
            review_cursor: 0,
            notice: None,
            store,
        })
    }

    pub fn reset(&mut self) -> Result<(), LoadError> {
        self.session = ExamSession::new(self.settings.session.clone(), self.questions.clone())?;
        self.state = AppState::Intro;
        self.selection = Selection::default();
        self.review_cursor = 0;
        self.notice = None;
        Ok(())
    }

    pub fn result(&self) -> Option<&ResultRecord> {
        self.session.result()
    }

    /// 1-based review page holding the cursor
    pub fn review_page(&self) -> usize {
        self.review_cursor / DEFAULT_PAGE_SIZE + 1
    }

    /// Outcome under the review cursor and the question it came from
    pub fn reviewed(&self) -> Option<(&QuestionOutcome, Option<&Question>)> {
        let outcome = self.result()?.questions.get(self.review_cursor)?;
        let question = self.questions.iter().find(|q| q.id == outcome.id);
        Some((outcome, question))
    }

    fn reviewed_question(&self) -> Option<&Question> {
        self.reviewed().and_then(|(_, q)| q)
    }

    fn reviewed_count(&self) -> usize {
        self.result().map_or(0, |r| r.questions.len())
    }

    fn move_review_cursor(&mut self, to: usize) {
        self.review_cursor = to.min(self.reviewed_count().saturating_sub(1));
    }

    pub fn on_tick(&mut self) {
        if !matches!(
            self.session.status(),
            SessionStatus::InProgress | SessionStatus::Paused
        ) {
            return;
        }
        match self.session.tick() {
            Ok(SessionTick::Expired) => {
                self.notice = Some("Time is up".to_string());
                self.finish();
            }
            Ok(_) => {}
            Err(e) => log::warn!("tick rejected: {e}"),
        }
    }

    /// Complete the session, persist the result and show it
    fn finish(&mut self) {
        match self.session.complete() {
            Ok(result) => {
                if let Err(e) = self.store.save(&result) {
                    log::error!("failed to save result: {e}");
                    self.notice = Some(format!("Result not saved: {e}"));
                }
                self.state = AppState::Results;
                self.review_cursor = 0;
            }
            Err(e) => self.report(e.into()),
        }
    }

    fn report(&mut self, err: ExamError) {
        log::warn!("{err}");
        self.notice = Some(err.to_string());
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match self.state {
            AppState::Intro => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    match self.session.start() {
                        Ok(()) => self.state = AppState::Exam,
                        Err(e) => self.report(e.into()),
                    }
                }
            }
            AppState::Exam => self.on_exam_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('r') => {
                    self.review_cursor = 0;
                    self.state = AppState::Review;
                }
                KeyCode::Char('n') => {
                    if let Err(e) = self.reset() {
                        self.report(e.into());
                    }
                }
                _ => {}
            },
            AppState::Review => {
                let page_start = (self.review_page() - 1) * DEFAULT_PAGE_SIZE;
                match key.code {
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.move_review_cursor(self.review_cursor + 1)
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.move_review_cursor(self.review_cursor.saturating_sub(1))
                    }
                    KeyCode::Right | KeyCode::Char('l') => {
                        if page_start + DEFAULT_PAGE_SIZE < self.reviewed_count() {
                            self.move_review_cursor(page_start + DEFAULT_PAGE_SIZE);
                        }
                    }
                    KeyCode::Left | KeyCode::Char('h') => {
                        self.move_review_cursor(page_start.saturating_sub(DEFAULT_PAGE_SIZE))
                    }
                    KeyCode::Enter if self.reviewed_count() > 0 => {
                        self.state = AppState::QuestionReview
                    }
                    KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                    _ => {}
                }
            }
            AppState::QuestionReview => match key.code {
                KeyCode::Right | KeyCode::Char('l') => {
                    self.move_review_cursor(self.review_cursor + 1)
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    self.move_review_cursor(self.review_cursor.saturating_sub(1))
                }
                KeyCode::Char('o') => {
                    if let Some(link) = self
                        .reviewed_question()
                        .and_then(|q| q.learn_more_link.as_ref())
                    {
                        if Browser::is_available() {
                            webbrowser::open(&link.url).unwrap_or_default();
                        }
                    }
                }
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Review,
                _ => {}
            },
        }

        Flow::Continue
    }

    fn on_exam_key(&mut self, key: KeyEvent) {
        if self.session.status() == SessionStatus::Paused {
            match key.code {
                KeyCode::Char('p') => {
                    if let Err(e) = self.session.resume() {
                        self.report(e.into());
                    }
                }
                KeyCode::Char('f') => self.finish(),
                _ => {}
            }
            return;
        }

        let question = self.session.current_question().clone();
        let answered = self.session.is_current_answered();

        match key.code {
            KeyCode::Char('p') => {
                if let Err(e) = self.session.pause() {
                    self.report(e.into());
                }
            }
            KeyCode::Char('f') => self.finish(),
            KeyCode::Up | KeyCode::Char('k') => self.selection.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.selection.move_down(&question),
            KeyCode::Left if !answered => self.selection.cycle(&question, false),
            KeyCode::Right if !answered => self.selection.cycle(&question, true),
            KeyCode::Char(' ') if !answered => self.selection.toggle(&question),
            KeyCode::Char('o') if answered => {
                if let Some(link) = &question.learn_more_link {
                    if Browser::is_available() {
                        webbrowser::open(&link.url).unwrap_or_default();
                    }
                }
            }
            KeyCode::Enter if answered => self.advance(),
            KeyCode::Enter => match self.selection.answer(&question) {
                Some(answer) => {
                    self.notice = None;
                    if let Err(e) = self.session.submit_answer(answer) {
                        self.report(e);
                    }
                }
                None => self.notice = Some("Finish your selection before submitting".to_string()),
            },
            _ => {}
        }
    }

    fn advance(&mut self) {
        match self.session.next_question() {
            Ok(true) => {
                self.selection = Selection::default();
                self.notice = None;
            }
            Ok(false) => self.finish(),
            Err(e) => self.report(e.into()),
        }
    }
}

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    // stderr belongs to the TUI; log to a file in the state dir instead
    if let Some(path) = AppDirs::log_path() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    let _ = builder.try_init();
}

/// Pick the questions to ask: an explicit file, else the configured bundled exam
fn resolve_questions(
    cli: &Cli,
    config: &Config,
    catalog: &Catalog,
) -> Result<(String, String, Vec<Question>), Box<dyn Error>> {
    if let Some(path) = &cli.questions {
        let json = fs::read_to_string(path)?;
        let questions = load_json(&json)?;
        let exam_type = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        return Ok((exam_type.clone(), catalog.title_for(&exam_type), questions));
    }

    let exam = catalog.get(&config.exam_type)?;
    Ok((exam.id.clone(), exam.title.clone(), exam.questions.clone()))
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_defaults {
        config_store.save(&config)?;
    }

    let catalog = Catalog::bundled()?;

    if cli.list {
        for info in catalog.list() {
            println!(
                "{:<18} {:>3} questions  {}",
                info.id, info.question_count, info.title
            );
        }
        return Ok(());
    }

    let store = SqliteResultStore::new()?;

    if cli.last {
        match store.load()? {
            Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            None => println!("no stored result"),
        }
        return Ok(());
    }

    let (exam_type, title, questions) = resolve_questions(&cli, &config, &catalog)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings = Settings {
        title,
        session: SessionConfig {
            exam_type,
            ..config.session_config()
        },
        pass_mark: config.pass_mark,
    };
    let mut app = App::new(settings, questions, Box::new(store))?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let flow = match runner.step() {
            ExamEvent::Tick => {
                app.on_tick();
                Flow::Continue
            }
            ExamEvent::Resize => Flow::Continue,
            ExamEvent::Key(key) => app.on_key(key),
        };

        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}
