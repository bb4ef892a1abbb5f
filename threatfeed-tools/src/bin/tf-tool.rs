use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use threatfeed::data::EventFilter;
use threatfeed::{FeedConfig, LogFeed};
use threatfeed_tools::{build_filter, init_term_logger, FeedOpts};

#[derive(Parser, Debug)]
#[command(
    name = "tf-tool",
    version,
    about = "Generate and inspect simulated threat feed events"
)]
struct Cli {
    #[command(flatten)]
    feed: FeedOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print freshly generated events
    Generate {
        /// Number of events
        #[arg(short = 'N', long = "count", default_value_t = 10)]
        count: usize,

        /// Emit YAML records instead of one line per event
        #[arg(long)]
        yaml: bool,
    },

    /// Run the feed headless and print each event as it arrives
    Tail {
        /// Stop after this many ticks (default: run forever)
        #[arg(long = "ticks")]
        ticks: Option<u64>,

        /// Only print events passing this filter (all, bots, threats, suspicious)
        #[arg(short = 'f', long = "filter", default_value = "all")]
        filter: String,

        /// Only print events matching this text
        #[arg(short = 's', long = "search")]
        search: Option<String>,

        /// Print the seeded window before tailing
        #[arg(long)]
        backlog: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

fn generate(config: &FeedConfig, count: usize, yaml: bool) -> Result<(), String> {
    let events: Vec<_> = config.generator().take(count).collect();
    if yaml {
        let text = serde_yaml::to_string(&events).map_err(|e| e.to_string())?;
        print!("{}", text);
    } else {
        for event in &events {
            println!("{}", event);
        }
    }
    Ok(())
}

fn tail(
    config: &FeedConfig,
    ticks: Option<u64>,
    filter_name: &str,
    search: Option<&str>,
    backlog: bool,
) -> Result<(), String> {
    let filter = build_filter(filter_name, config.threat_threshold, search, None)
        .map_err(|e| e.to_string())?;

    let mut feed = LogFeed::from_config(config);
    feed.set_filter(filter.clone());
    let token = feed.mount();

    if backlog {
        let window: Vec<_> = feed.view().collect();
        for event in window.iter().rev() {
            println!("{}", event);
        }
    }

    log::info!("tailing with filter {}", filter);
    let mut seen = 0;
    while ticks.map_or(true, |max| seen < max) {
        let Some(event) = feed.wait(Duration::from_secs(3600)) else {
            continue;
        };
        seen += 1;
        if filter.matches(&event) {
            println!("{}", event);
        }
    }

    feed.unmount(token);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_term_logger(cli.feed.log_level()) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let config = match cli.feed.load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Generate { count, yaml } => generate(&config, count, yaml),
        Commands::Tail {
            ticks,
            filter,
            search,
            backlog,
        } => tail(&config, ticks, &filter, search.as_deref(), backlog),
        Commands::Config => config
            .to_yaml()
            .map(|text| print!("{}", text))
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
