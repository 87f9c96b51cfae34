//! CLI (Command Line Interface) mode
//!
//! Interactive planner working directly on the local database. Days are drawn
//! as hour grids with the current time marked.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::{Days, NaiveDate, Timelike};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use dayline_core::settings::greeting;
use dayline_core::task::{DEFAULT_COLORS, EMOJI_SET};
use dayline_core::time::{parse_weekday_token, time_to_minutes};
use dayline_core::validate::parse_date;
use dayline_core::{
    Agenda, AuthService, Clock, Config, Identity, LoginGrant, NowTicker, PatchDraft, Settings,
    SystemClock, TaskDraft, TaskPatch, TaskRecord, TaskSnapshot, TaskStore, agenda_page, day_view,
};
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};
use tracing::{info, warn};

use crate::render::{render_day, render_summary, short_id, task_line};

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/register", "<login> <password> [name] - create an account"),
    ("/login", "<login> <password> - sign in"),
    ("/logout", "sign out"),
    ("/whoami", "show the signed-in account"),
    ("/today", "show today's timeline"),
    ("/day", "<YYYY-MM-DD> - show one day's timeline"),
    ("/week", "list the next seven days"),
    ("/agenda", "list the first batch of days"),
    ("/more", "load the next batch of days"),
    ("/tasks", "list stored tasks"),
    ("/add", "<date|today|tomorrow|weekday> <start> [end] <title>"),
    ("/done", "<id> - toggle completion"),
    ("/rm", "<id> - delete a task"),
    ("/emoji", "<id> <0-7> - set the category marker"),
    ("/color", "<id> <0-7> - set the color"),
    ("/watch", "follow today's timeline until Ctrl+C"),
    ("/sound", "toggle the bell"),
    ("/welcome", "toggle the greeting"),
    ("/help", "show help"),
    ("/exit", "quit"),
    ("/quit", "quit"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        // Only the command word is completed
        if !line.starts_with('/') || line.contains(' ') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Prompt showing the signed-in login
struct ColoredPrompt {
    style: Style,
    login: Option<String>,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
            login: None,
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        let text = match &self.login {
            Some(login) => format!("{login} > "),
            None => "> ".to_string(),
        };
        std::borrow::Cow::Owned(self.style.paint(text).to_string())
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: reedline::PromptEditMode) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }
}

/// What the REPL does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Planner state for one terminal session
struct Session {
    config: Config,
    auth: AuthService,
    tasks: TaskStore,
    clock: Arc<dyn Clock>,
    settings: Settings,
    settings_path: PathBuf,
    /// Last listed tasks, shown when the store cannot be read
    snapshot_path: Option<PathBuf>,
    identity: Option<Identity>,
    agenda: Agenda,
}

impl Session {
    fn new(
        config: Config,
        auth: AuthService,
        tasks: TaskStore,
        clock: Arc<dyn Clock>,
        settings: Settings,
        settings_path: PathBuf,
    ) -> Self {
        let agenda = Agenda::from_config(&config.calendar);
        Self {
            config,
            auth,
            tasks,
            clock,
            settings,
            settings_path,
            snapshot_path: None,
            identity: None,
            agenda,
        }
    }

    /// Open the stores and preferences named in the config
    fn open(config: Config) -> anyhow::Result<Self> {
        let db_path = config.database.db_path.clone();
        if let Some(parent) = Path::new(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let auth = AuthService::open(&db_path, &config.auth)?;
        let tasks = TaskStore::new(&db_path)?;
        let settings_path = Settings::path_for(&db_path);
        let settings = Settings::load(&settings_path)?;

        let mut session = Self::new(
            config,
            auth,
            tasks,
            Arc::new(SystemClock),
            settings,
            settings_path,
        );
        session.snapshot_path = Some(TaskSnapshot::path_for(&db_path));
        Ok(session)
    }

    fn identity(&self) -> anyhow::Result<&Identity> {
        match &self.identity {
            Some(identity) => Ok(identity),
            None => bail!("Not signed in. Use /login or /register first"),
        }
    }

    fn records(&self) -> anyhow::Result<Vec<TaskRecord>> {
        let identity = self.identity()?;
        self.reconcile(&identity.user_id, self.tasks.list(&identity.user_id))
    }

    /// Cache a fresh listing, or fall back to the cached one when the store failed
    fn reconcile(
        &self,
        user_id: &str,
        listed: dayline_core::Result<Vec<TaskRecord>>,
    ) -> anyhow::Result<Vec<TaskRecord>> {
        let Some(path) = &self.snapshot_path else {
            return Ok(listed?);
        };

        match listed {
            Ok(tasks) => {
                if let Err(e) = TaskSnapshot::new(user_id, tasks.clone()).save(path) {
                    warn!("Failed to cache tasks at {}: {}", path.display(), e);
                }
                Ok(tasks)
            }
            Err(err) => match TaskSnapshot::load_for(path, user_id) {
                Ok(Some(snapshot)) => {
                    warn!("Task store unavailable, using cached tasks: {}", err);
                    println!(
                        "{}",
                        Color::Yellow.paint(format!(
                            "⚠️  Showing tasks cached at {}",
                            snapshot.saved_at.format("%Y-%m-%d %H:%M")
                        ))
                    );
                    Ok(snapshot.tasks)
                }
                Ok(None) => Err(err.into()),
                Err(e) => {
                    warn!("Failed to read task cache at {}: {}", path.display(), e);
                    Err(err.into())
                }
            },
        }
    }

    /// Ring the terminal bell when sound is on
    fn bell(&self) {
        if self.settings.sound_enabled {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }

    /// Dispatch one line of input
    async fn handle(&mut self, input: &str) -> anyhow::Result<Flow> {
        let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        match command.to_lowercase().as_str() {
            "/exit" | "/quit" | "/q" => return Ok(Flow::Exit),
            "/help" | "/?" => print_help(),
            "/register" => self.register(rest)?,
            "/login" => self.login(rest)?,
            "/logout" => {
                self.identity = None;
                println!("\n👋 Signed out.\n");
            }
            "/whoami" => self.whoami()?,
            "/today" => self.show_day(self.clock.today())?,
            "/day" => {
                let date = parse_date(rest).map_err(|e| anyhow::anyhow!("{e}"))?;
                self.show_day(date)?;
            }
            "/week" => self.list_days(0, 7)?,
            "/agenda" => {
                self.agenda = Agenda::from_config(&self.config.calendar);
                self.list_days(0, self.agenda.loaded())?;
            }
            "/more" => self.more()?,
            "/tasks" => self.list_tasks()?,
            "/add" => self.add(rest)?,
            "/done" => self.toggle_done(rest)?,
            "/rm" => self.remove(rest)?,
            "/emoji" => self.set_marker(rest, Marker::Emoji)?,
            "/color" => self.set_marker(rest, Marker::Color)?,
            "/watch" => self.watch().await?,
            "/sound" => {
                let on = self.settings.toggle_sound();
                self.settings.save(&self.settings_path)?;
                println!("\n🔔 Sound {}\n", if on { "on" } else { "off" });
            }
            "/welcome" => {
                let on = self.settings.toggle_welcome();
                self.settings.save(&self.settings_path)?;
                println!("\n👋 Greeting {}\n", if on { "on" } else { "off" });
            }
            _ => bail!("Unknown command: {}. Type /help for the command list", command),
        }

        Ok(Flow::Continue)
    }

    fn sign_in(&mut self, grant: LoginGrant) -> anyhow::Result<()> {
        let identity = self.auth.authenticate(&grant.token)?;
        info!("Signed in as {}", identity.login);
        self.identity = Some(identity);

        if self.settings.welcome_animation_enabled {
            let name = grant.user.name.as_deref().unwrap_or(&grant.user.login);
            println!("\n☀️  {}, {}!\n", greeting(self.clock.now().hour()), name);
        } else {
            println!("\n✅ Signed in as {}\n", grant.user.login);
        }
        Ok(())
    }

    fn register(&mut self, rest: &str) -> anyhow::Result<()> {
        let mut parts = rest.splitn(3, ' ');
        let login = parts.next().unwrap_or_default();
        let password = parts.next().unwrap_or_default();
        let name = parts.next().map(str::trim).filter(|n| !n.is_empty());

        let grant = self.auth.register(login, password, name)?;
        self.sign_in(grant)
    }

    fn login(&mut self, rest: &str) -> anyhow::Result<()> {
        let (login, password) = rest.split_once(' ').unwrap_or((rest, ""));
        let grant = self.auth.login(login, password.trim())?;
        self.sign_in(grant)
    }

    fn whoami(&self) -> anyhow::Result<()> {
        let profile = self.auth.profile(self.identity()?)?;
        println!();
        println!("👤 {}", profile.login);
        if let Some(name) = &profile.name {
            println!("   name: {}", name);
        }
        println!("   since: {}", profile.created_at.format("%Y-%m-%d"));
        println!();
        Ok(())
    }

    fn show_day(&self, date: NaiveDate) -> anyhow::Result<()> {
        let records = self.records()?;
        let day = day_view(&records, date, self.clock.as_ref(), &self.config.calendar);
        println!("\n{}", render_day(&day));
        Ok(())
    }

    fn list_days(&self, offset: u32, count: u32) -> anyhow::Result<()> {
        let records = self.records()?;
        let page = agenda_page(
            &records,
            self.clock.as_ref(),
            &self.config.calendar,
            offset,
            count,
        );

        println!();
        for day in &page.days {
            println!("{}", render_summary(day));
        }
        if page.has_more {
            println!("{}", Style::new().dimmed().paint("/more for the next days"));
        }
        Ok(())
    }

    fn more(&mut self) -> anyhow::Result<()> {
        self.identity()?;
        let range = self.agenda.load_more();
        if range.is_empty() {
            println!(
                "\nEnd of the list ({} days ahead)\n",
                self.config.calendar.max_days_ahead
            );
            return Ok(());
        }
        self.list_days(range.start, range.end - range.start)
    }

    fn list_tasks(&self) -> anyhow::Result<()> {
        let records = self.records()?;
        println!();
        if records.is_empty() {
            println!("No tasks yet. Add one with /add");
        }
        for task in &records {
            let when = match (&task.date, &task.weekly_day) {
                (Some(date), _) => date.to_string(),
                (None, Some(day)) => format!("every {day}"),
                (None, None) => "-".to_string(),
            };
            println!("{:<14} {}", when, task_line(task));
        }
        println!();
        Ok(())
    }

    fn add(&self, rest: &str) -> anyhow::Result<()> {
        let identity = self.identity()?;
        let draft = parse_add(rest, self.clock.today()).map_err(|e| anyhow::anyhow!(e))?;
        let task = draft.into_new_task().map_err(|e| anyhow::anyhow!("{e}"))?;

        let record = self.tasks.create(&identity.user_id, task)?;
        println!("\n✅ Added {}\n", task_line(&record));
        Ok(())
    }

    /// Find one of the caller's tasks by id prefix
    fn resolve(&self, prefix: &str) -> anyhow::Result<TaskRecord> {
        if prefix.is_empty() {
            bail!("Missing task id");
        }
        let mut matches = self
            .records()?
            .into_iter()
            .filter(|t| t.id.starts_with(prefix));

        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task),
            (None, _) => bail!("No task with id {}", prefix),
            (Some(_), Some(_)) => bail!("Several tasks start with {}, use a longer id", prefix),
        }
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> anyhow::Result<TaskRecord> {
        let identity = self.identity()?;
        Ok(self.tasks.update(&identity.user_id, id, patch)?)
    }

    fn toggle_done(&self, rest: &str) -> anyhow::Result<()> {
        let task = self.resolve(rest)?;
        let record = self.update(&task.id, &TaskPatch::done(!task.done))?;
        if record.done {
            self.bell();
        }
        println!("\n{}\n", task_line(&record));
        Ok(())
    }

    fn remove(&self, rest: &str) -> anyhow::Result<()> {
        let task = self.resolve(rest)?;
        let identity = self.identity()?;
        self.tasks.delete(&identity.user_id, &task.id)?;
        println!("\n🗑️  Deleted {} {}\n", short_id(&task.id), task.display_title());
        Ok(())
    }

    fn set_marker(&self, rest: &str, marker: Marker) -> anyhow::Result<()> {
        let (prefix, index) = rest.split_once(' ').unwrap_or((rest, ""));
        let task = self.resolve(prefix)?;
        let index: usize = index
            .trim()
            .parse()
            .ok()
            .filter(|i| *i < 8)
            .context("Choose a number from 0 to 7")?;

        let draft = match marker {
            Marker::Emoji => PatchDraft {
                emoji: Some(Some(EMOJI_SET[index].to_string())),
                ..PatchDraft::default()
            },
            Marker::Color => PatchDraft {
                color: Some(DEFAULT_COLORS[index].to_string()),
                ..PatchDraft::default()
            },
        };
        let patch = draft.into_patch().map_err(|e| anyhow::anyhow!("{e}"))?;
        let record = self.update(&task.id, &patch)?;
        println!("\n{}\n", task_line(&record));
        Ok(())
    }

    /// Redraw today's timeline on every tick until Ctrl+C
    async fn watch(&self) -> anyhow::Result<()> {
        let records = self.records()?;
        let today = self.clock.today();
        let mut day = day_view(&records, today, self.clock.as_ref(), &self.config.calendar);

        let ticker = NowTicker::new(
            self.clock.clone(),
            today,
            &day.timeline,
            Duration::from_secs(self.config.calendar.tick_secs.max(1)),
        )
        .start();
        let mut marker = ticker.subscribe();

        loop {
            day.timeline.now_offset = *marker.borrow_and_update();
            let mut stdout = std::io::stdout();
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
            println!("{}", render_day(&day));
            println!("{}", Style::new().dimmed().paint("Ctrl+C to stop watching"));

            tokio::select! {
                changed = marker.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        ticker.stop().await;
        println!();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Emoji,
    Color,
}

/// Parse `/add` arguments: `<when> <start> [end] <title>`.
///
/// `when` is a date, `today`, `tomorrow` or a weekday token for a weekly
/// task. Field validation is left to [`TaskDraft::into_new_task`].
fn parse_add(rest: &str, today: NaiveDate) -> Result<TaskDraft, String> {
    const USAGE: &str = "Usage: /add <YYYY-MM-DD|today|tomorrow|mon..sun> <HH:MM> [HH:MM] <title>";

    let mut words = rest.split_whitespace();
    let (Some(when), Some(start)) = (words.next(), words.next()) else {
        return Err(USAGE.to_string());
    };
    let mut words = words.peekable();
    let end = words
        .next_if(|w| time_to_minutes(w).is_some())
        .map(str::to_string);
    let title = words.collect::<Vec<_>>().join(" ");

    let mut draft = TaskDraft {
        title: Some(title),
        start: Some(start.to_string()),
        end,
        ..TaskDraft::default()
    };

    match when.to_lowercase().as_str() {
        "today" => draft.date = Some(today.to_string()),
        "tomorrow" => {
            let date = today.checked_add_days(Days::new(1)).ok_or(USAGE)?;
            draft.date = Some(date.to_string());
        }
        token if parse_weekday_token(token).is_some() => {
            draft.weekly = Some(true);
            draft.weekly_day = Some(token.to_string());
        }
        _ => draft.date = Some(when.to_string()),
    }

    Ok(draft)
}

/// Run CLI interactive mode
pub async fn run_cli(config: Config) -> anyhow::Result<()> {
    let mut session = Session::open(config)?;

    info!("Starting CLI mode");

    if session.settings.welcome_animation_enabled {
        print_welcome(greeting(session.clock.now().hour()));
    }

    // Setup keybindings
    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![
            reedline::EditCommand::InsertChar('/'),
            reedline::EditCommand::Complete,
        ]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(60))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let mut prompt = ColoredPrompt::new();

    loop {
        prompt.login = session.identity.as_ref().map(|i| i.login.clone());
        let signal = line_editor.read_line(&prompt);

        match signal {
            Ok(Signal::Success(line)) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }
                if !input.starts_with('/') {
                    eprintln!("\n❓ Commands start with /. Type /help for the list.\n");
                    continue;
                }

                match session.handle(input).await {
                    Ok(Flow::Exit) => {
                        println!("\n👋 Bye!\n");
                        break;
                    }
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("\n❌ Error: {}\n", e),
                }
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("\n👋 Bye!\n");
                break;
            }
            Err(err) => {
                eprintln!("\n❌ Error: {}\n", err);
                break;
            }
        }
    }

    Ok(())
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    // Tab key triggers completion
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    // Esc key clears/closes menus
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Backspace,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Backspace]),
    );
    keybindings
}

/// Print welcome message
fn print_welcome(greeting: &str) {
    println!();
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║  🗓️  dayline                                                ║");
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║  {:<58}║", format!("{greeting}!"));
    println!("║  /login or /register to start, /help for all commands      ║");
    println!("║  Type / to see command suggestions                         ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
}

/// Print help message
fn print_help() {
    println!();
    println!("📖 Commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {:<10} {}", cmd, desc);
    }
    println!();
    println!("💡 Task ids can be shortened to any unique prefix");
    let emoji: Vec<String> = EMOJI_SET
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{i}={e}"))
        .collect();
    println!("💡 /emoji choices: {}", emoji.join(" "));
    println!();
}
