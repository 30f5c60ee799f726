/// runtime settings for circletrace
/// defaults → circletrace.json → environment → command line
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::mutation_config::MutateConfig;

pub const SETTINGS_FILE: &str = "circletrace.json";

// generations between disk snapshots when a path is given without an interval
const DEFAULT_SNAPSHOT_INTERVAL: u64 = 30;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // input
    pub target_path: Option<PathBuf>,

    // status server
    pub serve_http: bool,
    pub bind_host: String,
    pub port: u16,

    // periodic disk snapshot (disabled when path is None or interval is 0)
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: u64,

    /// log a progress line every N generations (0 = never)
    pub log_interval: u64,
    /// stop after this many generations (None = run until stopped)
    pub max_generations: Option<u64>,
    /// fixed RNG seed for reproducible runs
    pub seed: Option<u64>,

    // evolution parameters
    pub mutation: MutateConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            target_path: None,
            serve_http: true,
            bind_host: "127.0.0.1".to_owned(),
            port: 8080,
            snapshot_path: None,
            snapshot_interval: 0,
            log_interval: 30,
            max_generations: None,
            seed: None,
            mutation: MutateConfig::default(),
        }
    }
}

/// command line overrides, applied last
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "circletrace")]
#[command(about = "Approximate an image with translucent circles by hill climbing")]
pub struct Args {
    /// target image to approximate
    pub target: Option<PathBuf>,

    /// status server port
    #[arg(long)]
    pub port: Option<u16>,

    /// write the best image here periodically
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// stop after this many generations
    #[arg(long)]
    pub max_generations: Option<u64>,

    /// fixed RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

const LONG_FLAGS: [&str; 4] = ["port", "snapshot", "max-generations", "seed"];

impl Args {
    /// parse argv, also accepting single-dash long flags (`-port 9000`)
    pub fn try_parse_compat<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = argv.into_iter().map(|arg| {
            let mut arg: OsString = arg.into();
            if arg.to_str().is_some_and(is_single_dash_long) {
                let mut long = OsString::from("-");
                long.push(&arg);
                arg = long;
            }
            arg
        });
        Self::try_parse_from(argv)
    }
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else { return false };
    let name = rest.split('=').next().unwrap_or(rest);
    LONG_FLAGS.contains(&name)
}

impl AppSettings {
    /// load settings from a JSON file, or return defaults if the file doesn't exist or doesn't parse
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                    Self::default()
                }
            },
            // file doesn't exist or can't be read - use defaults
            Err(_) => Self::default(),
        }
    }

    /// full startup resolution: file, then process environment, then argv
    pub fn load() -> Result<Self, TraceError> {
        let args = Args::try_parse_compat(std::env::args_os()).unwrap_or_else(|e| e.exit());
        let mut settings = Self::load_file(Path::new(SETTINGS_FILE));
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.apply_args(args);
        settings.validate()?;
        Ok(settings)
    }

    /// command line values win over file and environment
    pub fn apply_args(&mut self, args: Args) {
        if let Some(target) = args.target {
            self.target_path = Some(target);
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(snapshot) = args.snapshot {
            self.snapshot_path = Some(snapshot);
            if self.snapshot_interval == 0 {
                self.snapshot_interval = DEFAULT_SNAPSHOT_INTERVAL;
            }
        }
        if let Some(max) = args.max_generations {
            self.max_generations = Some(max);
        }
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
    }

    /// apply environment overrides through `get` (injectable for tests)
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), TraceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(target) = get("CIRCLETRACE_TARGET") {
            self.target_path = Some(PathBuf::from(target));
        }
        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .map_err(|_| TraceError::InvalidSettings(format!("PORT is not a port number: {port}")))?;
        }
        if let Some(snapshot) = get("CIRCLETRACE_SNAPSHOT") {
            self.snapshot_path = Some(PathBuf::from(snapshot));
            if self.snapshot_interval == 0 {
                self.snapshot_interval = DEFAULT_SNAPSHOT_INTERVAL;
            }
        }
        if let Some(max) = get("CIRCLETRACE_MAX_GENERATIONS") {
            let max = max.parse().map_err(|_| {
                TraceError::InvalidSettings(format!("CIRCLETRACE_MAX_GENERATIONS is not a number: {max}"))
            })?;
            self.max_generations = Some(max);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        self.mutation.validate().map_err(TraceError::InvalidSettings)?;
        if self.max_generations == Some(0) {
            return Err(TraceError::InvalidSettings("max_generations must be at least 1".into()));
        }
        Ok(())
    }

    /// snapshot destination, only when both path and interval are set
    pub fn snapshot_target(&self) -> Option<(&Path, u64)> {
        match (&self.snapshot_path, self.snapshot_interval) {
            (Some(path), interval) if interval > 0 => Some((path.as_path(), interval)),
            _ => None,
        }
    }
}
