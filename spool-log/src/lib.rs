//! Line logging on top of spool regions.
//!
//! - `RegionLogger` - explicit `v/d/i/w/e(tag, msg)` calls
//! - `RegionLayer` - `tracing_subscriber` layer, one line per event
//!
//! ```rust,ignore
//! use spool::Region;
//! use spool_log::{RegionLayer, RegionLogger, SessionInfo};
//! use tracing_subscriber::layer::SubscriberExt;
//! use std::sync::Arc;
//!
//! let region = Arc::new(Region::open("/var/log/app/main", 50 * 1024 * 1024)?);
//! RegionLogger::new(region.clone())
//!     .write_banner(&SessionInfo::current(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))?;
//!
//! let subscriber = tracing_subscriber::registry().with(RegionLayer::new(region));
//! tracing::subscriber::set_global_default(subscriber)?;
//! ```

pub mod format;
mod layer;
mod logger;

pub use format::{format_line, session_banner, Level, SessionInfo};
pub use layer::RegionLayer;
pub use logger::RegionLogger;
