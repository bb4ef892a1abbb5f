// tf-monitor
//
// Live view of the simulated threat feed.
//
// Keys: a all / b bots / t threats / s suspicious / f next filter
// Quit: q / Esc / Ctrl-C

use chrono::Local;
use clap::Parser;
use crossbeam::channel;
use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{cursor, event, execute, style, terminal, QueueableCommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use threatfeed::data::{Event, Predicate, ThreatLevel};
use threatfeed::LogFeed;
use threatfeed_tools::{build_filter, init_file_logger, FeedOpts};

#[derive(Parser, Debug)]
#[command(
    name = "tf-monitor",
    version,
    about = "Live view of the simulated threat feed"
)]
struct Cli {
    #[command(flatten)]
    feed: FeedOpts,

    /// Initial filter (all, bots, threats, suspicious)
    #[arg(short = 'f', long = "filter", default_value = "all")]
    filter: String,

    /// Only show events matching this text
    #[arg(short = 's', long = "search")]
    search: Option<String>,

    /// Only show endpoints matching this glob, e.g. /api/*
    #[arg(short = 'e', long = "endpoint")]
    endpoint: Option<String>,

    /// UI refresh rate
    #[arg(long = "fps", default_value_t = 10)]
    fps: u64,

    /// Write log output to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Suppress footer hint
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn level_color(level: ThreatLevel) -> Color {
    match level {
        ThreatLevel::Critical => Color::Red,
        ThreatLevel::High => Color::Magenta,
        ThreatLevel::Medium => Color::Yellow,
        ThreatLevel::Low => Color::Cyan,
        ThreatLevel::Safe => Color::Green,
    }
}

fn format_row(event: &Event) -> String {
    let markers = event.markers().join(" ");
    format!(
        "{:<8} {:>8}  {:<15} ({})  {:<6} {:<16}  req={:<3} hourly={:<2} risk={:<2} depth={}  {}",
        event.threat_level(),
        event.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string(),
        event.origin.ip.to_string(),
        event.origin.country,
        event.request.method,
        event.request.endpoint,
        event.activity.request_count,
        event.activity.hourly_requests,
        event.origin.country_risk_score,
        event.request.endpoint_depth,
        markers,
    )
}

/// Puts the terminal back into cooked mode on the main screen.
fn restore_terminal() {
    let mut out = io::stdout();
    let _ = execute!(out, cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Owns the alternate screen for as long as it lives.
struct Screen {
    out: io::Stdout,
}

impl Screen {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, terminal::EnterAlternateScreen, cursor::Hide) {
            restore_terminal();
            return Err(e);
        }
        Ok(Screen { out })
    }

    fn draw(&mut self, feed: &LogFeed, quiet: bool) -> io::Result<()> {
        let stats = feed.stats();

        self.out.queue(cursor::MoveTo(0, 0))?;
        self.out
            .queue(terminal::Clear(terminal::ClearType::All))?;

        // Header
        self.out.queue(SetAttribute(Attribute::Bold))?;
        self.out.queue(style::Print(format!(
            "tf-monitor - filter: {}  showing {} of {} (capacity {})  every {:?}  ticks {}",
            feed.filter(),
            stats.total,
            feed.buffer().len(),
            feed.buffer().capacity(),
            feed.interval(),
            feed.ticks(),
        )))?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(cursor::MoveToNextLine(1))?;

        // Summary
        let top = stats
            .top_countries(3)
            .iter()
            .map(|(c, n)| format!("{c}:{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.out.queue(style::Print(format!(
            "bots {}  humans {}  automated {}  suspicious {}  high+ {}  mean score {:.1}  top {}",
            stats.bots,
            stats.humans(),
            stats.automated,
            stats.suspicious,
            stats.high_or_worse(),
            stats.mean_score(),
            top,
        )))?;
        self.out.queue(cursor::MoveToNextLine(2))?;

        // Event rows
        for event in feed.view() {
            self.out
                .queue(SetForegroundColor(level_color(event.threat_level())))?;
            self.out.queue(style::Print(format_row(event)))?;
            self.out.queue(ResetColor)?;
            self.out.queue(cursor::MoveToNextLine(1))?;
        }

        if !quiet {
            self.out.queue(cursor::MoveToNextLine(1))?;
            self.out.queue(style::Print(
                "a all  b bots  t threats  s suspicious  f next filter  q/Esc quit",
            ))?;
        }

        self.out.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.feed.load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let threshold = config.threat_threshold;
    let filter = match build_filter(
        &cli.filter,
        threshold,
        cli.search.as_deref(),
        cli.endpoint.as_deref(),
    ) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &cli.log_file {
        if let Err(e) = init_file_logger(cli.feed.log_level(), path) {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let mut feed = LogFeed::from_config(&config);
    feed.set_filter(filter);

    let mut screen = match Screen::enter() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot take over the terminal: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    // keys are read on their own thread and forwarded to the UI loop
    let (key_tx, key_rx) = channel::unbounded();
    std::thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if key_tx.send(ev).is_err() {
                return;
            }
        }
    });

    let frame = channel::tick(Duration::from_millis(1000 / cli.fps.max(1)));
    let token = feed.mount();
    let mut dirty = true;
    let mut status = ExitCode::SUCCESS;

    'main: loop {
        crossbeam::select! {
            recv(key_rx) -> ev => {
                if let Ok(event::Event::Key(k)) = ev {
                    use event::{KeyCode, KeyEventKind, KeyModifiers};
                    if k.kind == KeyEventKind::Release {
                        continue 'main;
                    }
                    let quit = k.code == KeyCode::Char('q')
                             || k.code == KeyCode::Esc
                             || (k.code == KeyCode::Char('c') && k.modifiers == KeyModifiers::CONTROL);
                    if quit { break 'main; }
                    match k.code {
                        KeyCode::Char('a') => feed.set_predicate(Predicate::All),
                        KeyCode::Char('b') => feed.set_predicate(Predicate::Bots),
                        KeyCode::Char('t') => feed.set_predicate(Predicate::Threats { min_score: threshold }),
                        KeyCode::Char('s') => feed.set_predicate(Predicate::Suspicious),
                        KeyCode::Char('f') => {
                            let p = feed.cycle_predicate();
                            log::info!("filter switched to {}", p);
                        }
                        _ => {}
                    }
                }
                dirty = true;
            }

            recv(frame) -> _ => {
                if feed.poll() > 0 {
                    dirty = true;
                }
            }
        }

        if dirty {
            if let Err(e) = screen.draw(&feed, cli.quiet) {
                log::error!("draw failed: {}", e);
                status = ExitCode::FAILURE;
                break 'main;
            }
            dirty = false;
        }
    }

    feed.unmount(token);
    drop(screen);
    status
}
