//! Level/tag line logger backed by a region.

use crate::format::{format_line, session_banner, Level, SessionInfo};
use chrono::Local;
use spool::Region;
use std::sync::Arc;

/// Writes formatted log lines into a [`Region`].
///
/// Lines below `min_level` are discarded before reaching the region.
#[derive(Debug, Clone)]
pub struct RegionLogger {
    region: Arc<Region>,
    min_level: Level,
}

impl RegionLogger {
    pub fn new(region: Arc<Region>) -> Self {
        Self {
            region,
            min_level: Level::Verbose,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn region(&self) -> &Arc<Region> {
        &self.region
    }

    pub fn log(&self, level: Level, tag: &str, msg: &str) -> spool::Result<()> {
        if level < self.min_level {
            return Ok(());
        }
        let line = format_line(&Local::now().naive_local(), level, tag, msg);
        self.region.write(line.as_bytes())
    }

    pub fn v(&self, tag: &str, msg: &str) -> spool::Result<()> {
        self.log(Level::Verbose, tag, msg)
    }

    pub fn d(&self, tag: &str, msg: &str) -> spool::Result<()> {
        self.log(Level::Debug, tag, msg)
    }

    pub fn i(&self, tag: &str, msg: &str) -> spool::Result<()> {
        self.log(Level::Info, tag, msg)
    }

    pub fn w(&self, tag: &str, msg: &str) -> spool::Result<()> {
        self.log(Level::Warn, tag, msg)
    }

    pub fn e(&self, tag: &str, msg: &str) -> spool::Result<()> {
        self.log(Level::Error, tag, msg)
    }

    /// Write the "PROCESS STARTED" block.
    pub fn write_banner(&self, info: &SessionInfo) -> spool::Result<()> {
        let banner = session_banner(info, &Local::now().naive_local());
        self.region.write(banner.as_bytes())
    }

    /// Queue a flush of the underlying region.
    pub fn flush(&self) -> spool::Result<()> {
        self.region.flush()
    }
}
