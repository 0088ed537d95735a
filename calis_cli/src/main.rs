use calis_core::*;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "calis")]
#[command(about = "Bodyweight workout planner and interval timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log out
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Suggest a balanced routine
    Recommend {
        /// Skill level (beginner, intermediate, advanced)
        #[arg(long)]
        level: Option<String>,

        /// Total workout time in minutes (1-60)
        #[arg(long)]
        minutes: Option<u32>,

        /// Replace the working routine with the suggestion
        #[arg(long)]
        apply: bool,
    },

    /// Build the working routine
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },

    /// Run the working routine with a countdown timer
    Start {
        /// Tick length in milliseconds (overrides config)
        #[arg(long)]
        tick_millis: Option<u64>,

        /// Run to completion without reading controls from stdin
        #[arg(long)]
        unattended: bool,

        /// Memo to attach when the session completes
        #[arg(long)]
        memo: Option<String>,

        /// Disable spoken countdown cues
        #[arg(long)]
        silent: bool,
    },

    /// Show or edit completed sessions
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Administrator views (admin account only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum RoutineAction {
    /// List the built-in exercises
    Exercises,
    /// Show the working routine
    List,
    /// Append an exercise
    Add {
        #[arg(long)]
        name: String,
        /// Work seconds
        #[arg(long, default_value_t = 45)]
        work: u32,
        /// Rest seconds
        #[arg(long, default_value_t = 15)]
        rest: u32,
    },
    /// Remove an exercise by id
    Remove { id: Uuid },
    /// Remove every exercise
    Clear,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List completed sessions, newest first
    List,
    /// Delete a completed session by id
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List members and their histories
    Overview {
        /// Only show this member's history
        #[arg(long)]
        user: Option<String>,
    },
    /// Append every member's history to a CSV file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    calis_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut repo = open_repository(&data_dir)?;

    match cli.command {
        Commands::Signup { email, password } => {
            let account = Accounts::new(&mut repo, &config.admin).sign_up(&email, &password)?;
            println!("✓ Signed up and logged in as {}", account.email());
            Ok(())
        }
        Commands::Login { email, password } => {
            let account = Accounts::new(&mut repo, &config.admin).log_in(&email, &password)?;
            if account.is_admin() {
                println!("✓ Logged in as administrator");
            } else {
                println!("✓ Logged in as {}", account.email());
            }
            Ok(())
        }
        Commands::Logout => {
            Accounts::new(&mut repo, &config.admin).log_out()?;
            println!("✓ Logged out");
            Ok(())
        }
        Commands::Whoami => {
            match Accounts::new(&mut repo, &config.admin).current()? {
                Some(Account::Admin(email)) => println!("{} (administrator)", email),
                Some(Account::Member(email)) => println!("{}", email),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Commands::Recommend {
            level,
            minutes,
            apply,
        } => cmd_recommend(&mut repo, &config, level, minutes, apply),
        Commands::Routine { action } => cmd_routine(&mut repo, &config, action),
        Commands::Start {
            tick_millis,
            unattended,
            memo,
            silent,
        } => cmd_start(
            &mut repo,
            &config,
            tick_millis.unwrap_or(config.session.tick_millis),
            unattended,
            memo,
            silent,
        ),
        Commands::History { action } => cmd_history(&mut repo, &config, action),
        Commands::Admin { action } => cmd_admin(&mut repo, &config, action),
    }
}

fn open_repository(data_dir: &Path) -> Result<Repository<FileStore>> {
    std::fs::create_dir_all(data_dir)?;
    Ok(Repository::new(FileStore::new(data_dir.join("store.json"))))
}

/// Email of the logged-in member; administrators have no routine or history
fn require_member(repo: &mut Repository<FileStore>, config: &Config) -> Result<String> {
    match Accounts::new(repo, &config.admin).current()? {
        Some(Account::Member(email)) => Ok(email),
        Some(Account::Admin(_)) => Err(Error::Auth(
            "The administrator account has no routine or history".into(),
        )),
        None => Err(Error::Auth("Log in first (calis login)".into())),
    }
}

fn require_admin(repo: &mut Repository<FileStore>, config: &Config) -> Result<()> {
    match Accounts::new(repo, &config.admin).current()? {
        Some(Account::Admin(_)) => Ok(()),
        _ => Err(Error::Auth("Administrator login required".into())),
    }
}

fn cmd_recommend(
    repo: &mut Repository<FileStore>,
    config: &Config,
    level: Option<String>,
    minutes: Option<u32>,
    apply: bool,
) -> Result<()> {
    let level = match level {
        Some(name) => name.parse::<SkillLevel>()?,
        None => config.recommendation.level,
    };
    let minutes = minutes.unwrap_or(config.recommendation.minutes);
    let request = RecommendationRequest::new(level, minutes)?;
    let recommendation = recommend(&request);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  RECOMMENDED ROUTINE ({}, {} min)", level, minutes);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", recommendation.reason);
    println!();
    print_routine(&recommendation.routine, false);
    println!("  Steps: {}", recommendation.routine.len());

    if apply {
        let (user, mut routine) = working_routine(repo, config)?;
        routine.replace_with(&recommendation.routine);
        repo.save_routine(&user, &routine)?;
        println!(
            "\n✓ Working routine replaced with {} recommended steps",
            recommendation.routine.len()
        );
    }
    Ok(())
}

fn cmd_routine(
    repo: &mut Repository<FileStore>,
    config: &Config,
    action: RoutineAction,
) -> Result<()> {
    match action {
        RoutineAction::Exercises => {
            let catalog = get_default_catalog();
            for category in Category::CYCLE {
                println!("{}:", category.label());
                for name in catalog.pool(category) {
                    println!("  - {}", name);
                }
            }
        }
        RoutineAction::List => {
            let (_, routine) = working_routine(repo, config)?;
            if routine.is_empty() {
                println!("Routine is empty. Add exercises or apply a recommendation.");
            } else {
                print_routine(&routine, true);
            }
        }
        RoutineAction::Add { name, work, rest } => {
            let (user, mut routine) = working_routine(repo, config)?;
            let id = routine.add_step(&name, work, rest)?;
            repo.save_routine(&user, &routine)?;
            println!("✓ Added {} ({})", name.trim(), id);
        }
        RoutineAction::Remove { id } => {
            let (user, mut routine) = working_routine(repo, config)?;
            if routine.remove_step(id) {
                repo.save_routine(&user, &routine)?;
                println!("✓ Removed {}", id);
            } else {
                eprintln!("No step with id {}", id);
            }
        }
        RoutineAction::Clear => {
            let (user, _) = working_routine(repo, config)?;
            repo.save_routine(&user, &Routine::new())?;
            println!("✓ Routine cleared");
        }
    }
    Ok(())
}

/// Logged-in member and their working routine
fn working_routine(
    repo: &mut Repository<FileStore>,
    config: &Config,
) -> Result<(String, Routine)> {
    let user = require_member(repo, config)?;
    let routine = repo.load_routine(&user)?;
    Ok((user, routine))
}

fn print_routine(routine: &Routine, with_ids: bool) {
    for (i, step) in routine.steps().iter().enumerate() {
        if with_ids {
            println!(
                "  {}. {} (work {}s / rest {}s)  [{}]",
                i + 1,
                step.name,
                step.work_seconds,
                step.rest_seconds,
                step.id
            );
        } else {
            println!(
                "  {}. {} (work {}s / rest {}s)",
                i + 1,
                step.name,
                step.work_seconds,
                step.rest_seconds
            );
        }
    }
    let total = routine.total_seconds();
    println!("  Total: {}m {}s", total / 60, total % 60);
}

/// Spoken cue stand-in that prints the countdown
struct TerminalCueSink;

impl CueSink for TerminalCueSink {
    fn speak(&mut self, text: &str, _locale: &str, _rate: f32) -> Result<()> {
        println!("  ♪ {}", text);
        Ok(())
    }

    fn cancel_all(&mut self) {}
}

fn build_cue_sink(config: &Config, silent: bool) -> Box<dyn CueSink> {
    if silent || !config.cues.enabled {
        return Box::new(SilentCueSink);
    }
    match &config.cues.command {
        Some(program) => Box::new(CommandCueSink::new(program.clone(), config.cues.args.clone())),
        None => Box::new(TerminalCueSink),
    }
}

/// Session controls typed on stdin
enum Control {
    TogglePause,
    Stop,
    Finish,
}

fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_lowercase().as_str() {
        "p" => Some(Control::TogglePause),
        "q" => Some(Control::Stop),
        "f" => Some(Control::Finish),
        _ => None,
    }
}

/// Forward stdin lines to the session loop
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn cmd_start(
    repo: &mut Repository<FileStore>,
    config: &Config,
    tick_millis: u64,
    unattended: bool,
    memo: Option<String>,
    silent: bool,
) -> Result<()> {
    let (user, routine) = working_routine(repo, config)?;
    if routine.is_empty() {
        eprintln!("Routine is empty. Add exercises or apply a recommendation first.");
        return Err(Error::Validation("Cannot start an empty routine".into()));
    }

    let mut engine = SessionEngine::new(build_cue_sink(config, silent), config.cues.settings());
    engine.start(&routine)?;

    if !unattended {
        println!("Controls: 'p' + Enter pause/resume, 'f' + Enter finish and save, 'q' + Enter stop");
    }
    let mut controls = if unattended {
        None
    } else {
        Some(spawn_stdin_reader())
    };

    let tick = Duration::from_millis(tick_millis);
    let mut next_tick = Instant::now() + tick;
    render(&engine.snapshot());

    let completed = loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        let received = controls.as_ref().map(|rx| rx.recv_timeout(wait));
        let line = match received {
            Some(Ok(line)) => Some(line),
            Some(Err(RecvTimeoutError::Timeout)) => None,
            Some(Err(RecvTimeoutError::Disconnected)) => {
                controls = None;
                continue;
            }
            None => {
                thread::sleep(wait);
                None
            }
        };

        if let Some(line) = line {
            match parse_control(&line) {
                Some(Control::TogglePause) => {
                    engine.toggle_pause();
                    render(&engine.snapshot());
                }
                Some(Control::Stop) => {
                    if let Some(event) = engine.stop(false) {
                        break summary_of(event);
                    }
                }
                Some(Control::Finish) => {
                    if let Some(event) = engine.stop(true) {
                        break summary_of(event);
                    }
                }
                None => {}
            }
            continue;
        }

        next_tick += tick;
        match engine.tick() {
            Some(SessionEvent::Completed(summary)) => break Some(summary),
            Some(SessionEvent::Aborted) => break None,
            Some(SessionEvent::PhaseChanged { .. }) | None => {
                if engine.status() == SessionStatus::Running {
                    render(&engine.snapshot());
                }
            }
        }
    };

    match completed {
        Some(summary) => {
            println!("\n🎉 Workout complete! {}", summary.duration_label());
            let memo = match memo {
                Some(memo) => memo,
                None => prompt_memo(controls.as_ref())?,
            };
            let session = summary.with_memo(&memo);

            let mut log = WorkoutLog::load(repo, &user);
            if log.record(repo, session) {
                println!("✓ Session saved");
            } else {
                eprintln!("Session could not be saved; see log output");
            }
        }
        None => {
            println!("\nSession stopped. Nothing was saved.");
        }
    }

    if let Err(e) = repo.save_routine(&user, &Routine::new()) {
        tracing::error!("Failed to clear working routine: {}", e);
    }
    Ok(())
}

/// Summary carried by a terminal event; `None` for an abort
fn summary_of(event: SessionEvent) -> Option<CompletedSession> {
    match event {
        SessionEvent::Completed(summary) => Some(summary),
        _ => None,
    }
}

fn prompt_memo(controls: Option<&Receiver<String>>) -> Result<String> {
    let Some(rx) = controls else {
        return Ok(String::new());
    };
    print!("How did it go? Leave a memo (Enter to skip): ");
    io::stdout().flush()?;
    Ok(rx.recv().unwrap_or_default())
}

fn render(snapshot: &SessionSnapshot) {
    let phase = match snapshot.phase {
        Phase::Work => "WORK",
        Phase::Rest => "REST",
    };
    let paused = if snapshot.status == SessionStatus::Paused {
        "  [paused]"
    } else {
        ""
    };
    let next = snapshot
        .next_step_name
        .as_deref()
        .map(|n| format!("  next: {}", n))
        .unwrap_or_default();
    println!(
        "{} {:>4}s  {}  ({}/{}){}{}",
        phase,
        snapshot.seconds_remaining,
        snapshot.current_step_name.as_deref().unwrap_or("-"),
        snapshot.current_index + 1,
        snapshot.total_steps,
        next,
        paused
    );
}

fn cmd_history(
    repo: &mut Repository<FileStore>,
    config: &Config,
    action: HistoryAction,
) -> Result<()> {
    let user = require_member(repo, config)?;
    let mut log = WorkoutLog::load(repo, &user);

    match action {
        HistoryAction::List => {
            if log.is_empty() {
                println!("No completed workouts yet.");
            }
            for session in log.sessions() {
                print_session(session);
            }
        }
        HistoryAction::Delete { id } => match log.delete(repo, id) {
            Some(true) => println!("✓ Deleted {}", id),
            Some(false) => eprintln!("Deleted {} for now, but it could not be saved", id),
            None => eprintln!("No session with id {}", id),
        },
    }
    Ok(())
}

fn print_session(session: &CompletedSession) {
    let when = session
        .performed_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");
    println!("\n  {} total  ({})  [{}]", session.duration_label(), when, session.id);
    for step in session.routine.steps() {
        println!("    - {} ({}s)", step.name, step.work_seconds);
    }
    if let Some(memo) = &session.memo {
        println!("    Memo: {}", memo);
    }
}

fn cmd_admin(
    repo: &mut Repository<FileStore>,
    config: &Config,
    action: AdminAction,
) -> Result<()> {
    require_admin(repo, config)?;
    let overview = AdminOverview::load(repo, &config.admin.email)?;

    match action {
        AdminAction::Overview { user } => {
            if overview.members.is_empty() {
                println!("No registered members.");
            }
            let members: Vec<&String> = match &user {
                Some(user) => overview.members.iter().filter(|m| *m == user).collect(),
                None => overview.members.iter().collect(),
            };
            for member in members {
                let history = overview.history_of(member);
                println!("{}: {} sessions", member, history.len());
                if user.is_some() {
                    for session in history {
                        print_session(session);
                    }
                }
            }
        }
        AdminAction::Export { out } => {
            let count = overview.export_csv(&out)?;
            println!("✓ Exported {} sessions to {}", count, out.display());
        }
    }
    Ok(())
}
