use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};
use threatfeed::data::{Filter, FilterError, Predicate};
use threatfeed::{ConfigError, FeedConfig};

#[derive(Parser, Debug, Clone)]
pub struct FeedOpts {
    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of events kept in the feed
    #[arg(short = 'n', long = "capacity")]
    pub capacity: Option<usize>,

    /// Milliseconds between generated events
    #[arg(short = 'i', long = "interval-ms")]
    pub interval_ms: Option<u64>,

    /// Minimum score for the threats filter
    #[arg(short = 't', long = "threshold")]
    pub threshold: Option<u8>,

    /// Seed for a reproducible feed
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Verbose logging (repeat for more)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl FeedOpts {
    /// Loads the configuration file (if any) and applies flag overrides.
    pub fn load_config(&self) -> Result<FeedConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::load(path)?,
            None => FeedConfig::default(),
        };
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
        if let Some(threshold) = self.threshold {
            config.threat_threshold = threshold;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Builds the initial filter from a predicate name plus optional refinements.
pub fn build_filter(
    name: &str,
    threshold: u8,
    search: Option<&str>,
    endpoint: Option<&str>,
) -> Result<Filter, FilterError> {
    let mut filter = Filter::new(Predicate::parse(name, threshold)?);
    if let Some(keyword) = search {
        filter = filter.with_keyword(keyword);
    }
    if let Some(pattern) = endpoint {
        filter = filter.with_endpoint(pattern)?;
    }
    Ok(filter)
}

fn log_config() -> simplelog::Config {
    let mut lcfg = ConfigBuilder::new();
    lcfg.set_time_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off);
    lcfg.build()
}

/// Logs to stderr.
pub fn init_term_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(
        level,
        log_config(),
        TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}

/// Logs to a file, for tools that own the terminal.
pub fn init_file_logger(level: LevelFilter, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    WriteLogger::init(level, log_config(), file)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn opts(args: &[&str]) -> FeedOpts {
        FeedOpts::parse_from(std::iter::once("tf").chain(args.iter().copied()))
    }

    #[test]
    fn flags_override_defaults() {
        let config = opts(&["-n", "5", "--interval-ms", "200", "--seed", "4"])
            .load_config()
            .unwrap();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.interval_ms, 200);
        assert_eq!(config.rng_seed, Some(4));
        assert_eq!(config.threat_threshold, 60);
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "capacity: 9\nthreat_threshold: 70").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let config = opts(&["-c", path.as_str(), "-t", "90"]).load_config().unwrap();
        assert_eq!(config.capacity, 9);
        assert_eq!(config.threat_threshold, 90);
    }

    #[test]
    fn invalid_override_is_rejected() {
        assert!(matches!(
            opts(&["-n", "0"]).load_config(),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(opts(&[]).log_level(), LevelFilter::Warn);
        assert_eq!(opts(&["-vv"]).log_level(), LevelFilter::Debug);
    }

    #[test]
    fn filter_from_flags() {
        let filter = build_filter("threats", 75, Some("login"), Some("/api/")).unwrap();
        assert_eq!(filter.predicate(), Predicate::Threats { min_score: 75 });
        assert_eq!(filter.keyword(), Some("login"));
        assert!(build_filter("people", 60, None, None).is_err());
    }
}
