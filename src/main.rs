mod display;

use std::fs::OpenOptions;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal, ExecutableCommand,
};
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

use wave_shooter::audio::AudioCommand;
use wave_shooter::config::{Config, LoggingConfig, StoreBackend};
use wave_shooter::entities::{HighscoreEntry, Phase};
use wave_shooter::game::{GameSettings, GameState, InputAction, Screen, ScoreSubmission};
use wave_shooter::store::{
    save_and_fetch, FileStore, MemoryStore, ScoreStore, StoreError, SupabaseStore,
};

use display::{Starfield, Viewport};

const STAR_COUNT: usize = 60;
const NICKNAME_MAX: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "wave_shooter")]
#[command(about = "Terminal arcade shooter: clear ten formation waves before the clock runs out")]
struct Cli {
    /// Configuration file (defaults to ./wave_shooter.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the high-score backend from the config file
    #[arg(long, value_enum)]
    store: Option<StoreBackend>,
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal is in raw mode while playing, so logs go to a file.
fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.file)
        .with_context(|| format!("opening log file {}", cfg.file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── High-score persistence ────────────────────────────────────────────────────

fn build_store(config: &Config) -> Result<Arc<dyn ScoreStore>> {
    let store = &config.store;
    Ok(match store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::new(&store.path)),
        StoreBackend::Supabase => Arc::new(
            SupabaseStore::new(&store.url, &store.api_key, &store.table, store.timeout())
                .context("building score service client")?,
        ),
    })
}

struct SaveReply {
    game_id: u64,
    result: Result<Vec<HighscoreEntry>, StoreError>,
}

/// Store round trips run here so a slow network never stalls a frame.
fn spawn_score_worker(
    store: Arc<dyn ScoreStore>,
    top_n: usize,
) -> (mpsc::Sender<ScoreSubmission>, mpsc::Receiver<SaveReply>) {
    let (job_tx, job_rx) = mpsc::channel::<ScoreSubmission>();
    let (reply_tx, reply_rx) = mpsc::channel::<SaveReply>();
    thread::spawn(move || {
        for job in job_rx {
            let result = save_and_fetch(store.as_ref(), &job.entry, top_n);
            let reply = SaveReply {
                game_id: job.game_id,
                result,
            };
            if reply_tx.send(reply).is_err() {
                break; // game loop gone
            }
        }
    });
    (job_tx, reply_rx)
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// No sound device in a terminal; cues are recorded in the log.
fn play_audio(cmd: AudioCommand) {
    match cmd {
        AudioCommand::Play { clip, volume, looped } => {
            tracing::trace!(clip = clip.name(), volume, looped, "play");
        }
        AudioCommand::Stop { clip } => tracing::trace!(clip = clip.name(), "stop"),
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

enum Flow {
    Continue,
    Quit,
}

/// Route one key press according to the current screen.
fn handle_key(
    key: KeyEvent,
    game: &mut GameState,
    nickname: &mut String,
    saves: &mpsc::Sender<ScoreSubmission>,
) -> Flow {
    let now = Instant::now();
    let KeyEvent { code, modifiers, .. } = key;

    if code == KeyCode::Esc
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
    {
        return Flow::Quit;
    }

    match game.phase() {
        Phase::Idle => match code {
            KeyCode::Enter | KeyCode::Char(' ') => game.start(now),
            KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            _ => {}
        },
        Phase::Playing => match code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                game.handle_input(InputAction::MoveLeft, now)
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                game.handle_input(InputAction::MoveRight, now)
            }
            KeyCode::Char(' ') => game.handle_input(InputAction::Fire, now),
            KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            _ => {}
        },
        Phase::GameOver => {
            let can_submit = matches!(game.screen(), Screen::GameOver(s) if s.can_submit());
            match code {
                KeyCode::Tab => {
                    nickname.clear();
                    game.reset();
                }
                KeyCode::Enter if can_submit => {
                    if let Some(submission) = game.submit_score(nickname) {
                        tracing::info!(nickname = %submission.entry.nickname, "submitting score");
                        if saves.send(submission).is_err() {
                            tracing::error!("score worker is gone");
                        }
                    }
                }
                KeyCode::Backspace if can_submit => {
                    nickname.pop();
                }
                KeyCode::Char(c) if can_submit && !c.is_control() => {
                    if nickname.chars().count() < NICKNAME_MAX {
                        nickname.push(c);
                    }
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    nickname.clear();
                    game.reset();
                }
                _ => {}
            }
        }
        Phase::Victory => match code {
            KeyCode::Enter | KeyCode::Tab | KeyCode::Char('r') | KeyCode::Char('R') => game.reset(),
            KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            _ => {}
        },
    }
    Flow::Continue
}

// ── Game loop ─────────────────────────────────────────────────────────────────

struct Channels {
    events: mpsc::Receiver<Event>,
    saves: mpsc::Sender<ScoreSubmission>,
    replies: mpsc::Receiver<SaveReply>,
}

fn game_loop<W: Write>(
    out: &mut W,
    game: &mut GameState,
    channels: &Channels,
    frame: Duration,
) -> std::io::Result<()> {
    let settings = game.settings().clone();
    let stars = Starfield::new(&mut thread_rng(), STAR_COUNT, settings.width, settings.height);
    let mut nickname = String::new();

    loop {
        let frame_start = Instant::now();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = channels.events.try_recv() {
            if let Event::Key(key) = ev {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if let Flow::Quit = handle_key(key, game, &mut nickname, &channels.saves) {
                    return Ok(());
                }
            }
        }

        while let Ok(reply) = channels.replies.try_recv() {
            game.finish_score_save(reply.game_id, reply.result);
        }

        game.update(Instant::now());

        for cmd in game.drain_audio() {
            play_audio(cmd);
        }

        let (cols, rows) = terminal::size()?;
        let view = Viewport::new(cols, rows, settings.width, settings.height);
        display::render(out, game, &view, &stars, &nickname)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(backend) = cli.store {
        config.store.backend = backend;
        config.validate().context("validating configuration")?;
    }
    init_logging(&config.logging)?;
    tracing::info!(backend = ?config.store.backend, "wave shooter starting");

    let store = build_store(&config)?;
    let (saves, replies) = spawn_score_worker(store, config.store.top_n);

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, events) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let channels = Channels {
        events,
        saves,
        replies,
    };
    let mut game = GameState::new(GameSettings::from(&config));
    let frame = Duration::from_millis(config.display.frame_ms.max(1));
    let result = game_loop(&mut out, &mut game, &channels, frame);

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    tracing::info!(score = game.session().score, "wave shooter exiting");
    result.map_err(Into::into)
}
