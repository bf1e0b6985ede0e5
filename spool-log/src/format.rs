//! Log line and session banner formatting.

use chrono::NaiveDateTime;
use std::fmt;

/// Log severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Single-letter tag used in log lines.
    pub fn as_char(self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Verbose,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `yyyy-MM-dd HH:mm:ss.SSS L/tag: msg\n`
pub fn format_line(time: &NaiveDateTime, level: Level, tag: &str, msg: &str) -> String {
    format!("{} {}/{}: {}\n", time.format(TIME_FORMAT), level, tag, msg)
}

/// Process details written at the top of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub pid: u32,
    pub process: String,
    pub package: String,
    pub version: String,
    pub device: String,
}

impl SessionInfo {
    /// Describe the running process. `package` and `version` identify the
    /// application, typically `env!("CARGO_PKG_NAME")` and
    /// `env!("CARGO_PKG_VERSION")` of the binary.
    pub fn current(package: &str, version: &str) -> Self {
        let process = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| package.to_owned());

        Self {
            pid: std::process::id(),
            process,
            package: package.to_owned(),
            version: version.to_owned(),
            device: format!("{} / {}", std::env::consts::ARCH, std::env::consts::OS),
        }
    }
}

const RULE: &str = "-------------------------------------------------------------------------";

/// Banner marking the start of a process in the log stream.
pub fn session_banner(info: &SessionInfo, time: &NaiveDateTime) -> String {
    format!(
        "---------------------------- PROCESS STARTED ----------------------------\n\
         Time       : {}\n\
         PID        : {}\n\
         Process    : {}\n\
         Package    : {}\n\
         Version    : {}\n\
         Device     : {}\n\
         {}\n",
        time.format(TIME_FORMAT),
        info.pid,
        info.process,
        info.package,
        info.version,
        info.device,
        RULE,
    )
}
