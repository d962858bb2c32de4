use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

/// Areas of the client whose debug lines can be switched on separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Keys,
    Api,
    Feed,
    Upload,
}

impl LogCategory {
    pub const ALL: [LogCategory; 4] = [
        LogCategory::Keys,
        LogCategory::Api,
        LogCategory::Feed,
        LogCategory::Upload,
    ];

    /// Log target the category's lines are written under
    pub fn target(self) -> &'static str {
        match self {
            LogCategory::Keys => "keys",
            LogCategory::Api => "api",
            LogCategory::Feed => "feed",
            LogCategory::Upload => "upload",
        }
    }
}

/// Where and how much the client logs. The terminal owns stdout, so
/// everything goes to `log_file`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_file: PathBuf,
    pub level: LevelFilter,
    pub categories: Vec<LogCategory>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("orbit_debug.log"),
            level: LevelFilter::Info,
            categories: vec![LogCategory::Api, LogCategory::Feed, LogCategory::Upload],
        }
    }
}

impl LogConfig {
    /// `--verbose`: every category, down to trace
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Trace,
            categories: LogCategory::ALL.to_vec(),
            ..Self::default()
        }
    }

    /// `--quiet`: warnings and errors only
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::Warn,
            categories: Vec::new(),
            ..Self::default()
        }
    }

    /// Whether debug lines of `category` would reach the file.
    pub fn logs(&self, category: LogCategory) -> bool {
        self.level >= LevelFilter::Debug && self.categories.contains(&category)
    }
}

/// Start the file logger, truncating the previous run's log.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let log_file = File::create(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    WriteLogger::init(config.level, log_config, log_file)?;

    log::info!(
        "Logging to {} at {:?}, categories {:?}",
        config.log_file.display(),
        config.level,
        config.categories
    );
    Ok(())
}

/// Debug line gated on a [`LogCategory`]:
/// `log_to!(app.log_config, Api, "GET /list_media")`.
#[macro_export]
macro_rules! log_to {
    ($config:expr, $category:ident, $($arg:tt)*) => {
        if $config.logs($crate::logging::LogCategory::$category) {
            log::debug!(
                target: $crate::logging::LogCategory::$category.target(),
                $($arg)*
            );
        }
    };
}
