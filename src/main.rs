use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use lecture_player::course::{Course, CourseNavigator, NavigationProvider};
use lecture_player::input::{KeyCode, KeyDispatcher, KeyEvent};
use lecture_player::media::{SimulatedHandle, SimulatedMedia};
use lecture_player::player::{Command, PlaybackSection, SectionBuilder, SectionHandler, VideoQuality};
use lecture_player::storage::{FileStore, KeyValueStore, MemoryStore};
use lecture_player::utils::{Config, StorageBackend};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Lecture Player - drive a course's playback section from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Course description (JSON)
    #[arg(value_name = "COURSE")]
    course: PathBuf,

    /// Index of the lecture to open first
    #[arg(short, long, default_value = "0")]
    lecture: usize,

    /// Volume used when none is remembered (0-100)
    #[arg(short, long, value_name = "VOLUME")]
    volume: Option<u8>,

    /// Configuration file to use instead of the default locations
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long)]
    memory_store: bool,

    /// Write the effective configuration to the user config file
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Requests the section sends back to the main loop
#[derive(Debug, Clone, Copy, PartialEq)]
enum AppSignal {
    Next,
    Previous,
    MarkComplete,
}

/// Forwards section callbacks to the main loop
struct ChannelHandler {
    tx: mpsc::UnboundedSender<AppSignal>,
}

impl ChannelHandler {
    fn send(&self, signal: AppSignal) {
        if self.tx.send(signal).is_err() {
            debug!("Main loop gone, dropping {:?}", signal);
        }
    }
}

impl SectionHandler for ChannelHandler {
    fn on_next(&self) {
        self.send(AppSignal::Next);
    }

    fn on_previous(&self) {
        self.send(AppSignal::Previous);
    }

    fn on_mark_complete(&self) {
        self.send(AppSignal::MarkComplete);
    }

    fn on_video_end(&self) {
        info!("Lecture finished");
    }

    fn on_time_update(&self, time: f64) {
        debug!("Position: {:.1}s", time);
    }
}

enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
keys:     space left right up down f m
media:    ready <secs> | tick <secs> | fail <message>
controls: seek <secs> | volume <0-100> | rate <r> | quality <q> | captions
course:   next | prev | goto <index> | complete
          help | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(volume) = args.volume {
        config.player.default_volume = f64::from(volume.min(100)) / 100.0;
    }

    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting Lecture Player v{}", env!("CARGO_PKG_VERSION"));

    if args.save_config {
        config.save()?;
        info!("Configuration saved");
    }

    let course = Course::from_file(&args.course)
        .with_context(|| format!("Failed to load course {:?}", args.course))?;
    info!("Loaded course '{}' with {} lectures", course.title, course.lectures.len());

    let navigator = Arc::new(CourseNavigator::from_course(course));
    if !navigator.is_empty() && !navigator.select(args.lecture) {
        warn!("No lecture at index {}, starting at the first", args.lecture);
    }

    let storage = open_storage(&config, args.memory_store);
    let (tx, mut signals) = mpsc::unbounded_channel();
    let keys = KeyDispatcher::new();
    let (media, engine) = SimulatedMedia::new();

    let mut section = SectionBuilder::new(
        Arc::clone(&navigator) as Arc<dyn NavigationProvider>,
        Arc::new(ChannelHandler { tx }),
    )
    .with_config(config.player.clone())
    .with_storage(storage)
    .with_lecture(navigator.current_lecture())
    .mount(Box::new(media), &keys);

    let mut completed: HashSet<u64> = HashSet::new();
    section.pump();
    println!("{}", section.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match handle_line(line.trim(), &mut section, &keys, &engine, &navigator) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => {
                        error!("{}", e);
                        continue;
                    }
                }
            }
            Some(signal) = signals.recv() => {
                match signal {
                    AppSignal::Next => section.go_to_next(),
                    AppSignal::Previous => section.go_to_previous(),
                    AppSignal::MarkComplete => {
                        if let Some(lecture) = section.lecture() {
                            info!("Lecture {} marked complete", lecture.id);
                            completed.insert(lecture.id);
                        }
                    }
                }
            }
        }

        let is_completed = section.lecture().is_some_and(|l| completed.contains(&l.id));
        section.set_completed(is_completed);
        section.pump();
        println!("{}", section.render());
    }

    section.unmount();
    info!("Lecture Player shutting down");
    Ok(())
}

/// Pick the preference store the configuration asks for
fn open_storage(config: &Config, memory_only: bool) -> Arc<dyn KeyValueStore> {
    if memory_only || config.storage.backend == StorageBackend::Memory {
        return Arc::new(MemoryStore::new());
    }

    let Some(path) = config.storage.resolved_path() else {
        warn!("No preferences location available, volume will not be remembered");
        return Arc::new(MemoryStore::new());
    };

    match FileStore::open(&path) {
        Ok(store) => {
            info!("Preferences stored in {:?}", store.path());
            Arc::new(store)
        }
        Err(e) => {
            warn!("Failed to open preferences {:?}: {}", path, e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// Execute one line of terminal input
fn handle_line(
    line: &str,
    section: &mut PlaybackSection,
    keys: &KeyDispatcher,
    engine: &SimulatedHandle,
    navigator: &CourseNavigator,
) -> Result<Flow> {
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let key = match word {
        "space" => Some(KeyCode::Space),
        "left" => Some(KeyCode::ArrowLeft),
        "right" => Some(KeyCode::ArrowRight),
        "up" => Some(KeyCode::ArrowUp),
        "down" => Some(KeyCode::ArrowDown),
        "f" => Some(KeyCode::KeyF),
        "m" => Some(KeyCode::KeyM),
        _ => None,
    };
    if let Some(code) = key {
        keys.dispatch(&KeyEvent::press(code));
        return Ok(Flow::Continue);
    }

    match word {
        "" => {}
        "ready" => engine.ready(parse_number(rest)?),
        "tick" => engine.tick(parse_number(rest)?),
        "fail" => engine.fail(if rest.is_empty() { "Failed to load video" } else { rest }),
        "seek" => section.execute(Command::SeekTo(parse_number(rest)?)),
        "volume" => section.execute(Command::SetVolume(parse_number(rest)? / 100.0)),
        "rate" => section.execute(Command::SetRate(parse_number(rest)?)),
        "quality" => section.execute(Command::SetQuality(rest.parse::<VideoQuality>()?)),
        "captions" => section.execute(Command::ToggleCaptions),
        "next" => section.go_to_next(),
        "prev" => section.go_to_previous(),
        "goto" => {
            let index: usize = rest.parse().map_err(|_| anyhow!("Invalid lecture index '{}'", rest))?;
            if !navigator.select(index) {
                bail!("No lecture at index {}", index);
            }
            section.sync_with_navigation();
        }
        "complete" => section.mark_complete(),
        "help" => println!("{}", HELP),
        "quit" | "q" => return Ok(Flow::Quit),
        other => bail!("Unknown command '{}', try 'help'", other),
    }
    Ok(Flow::Continue)
}

fn parse_number(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| anyhow!("Expected a number, got '{}'", text))
}
