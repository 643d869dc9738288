//! routemap Core Library
//!
//! Core types, route patterns, configuration, and error handling for routemap.

pub mod config;
pub mod error;
pub mod path;
pub mod pattern;

pub use config::{ChangeFreq, Config, CrawlPolicy, Header, HeaderRule, RedirectRule};
pub use error::{CoreError, Result};
pub use path::{PathPattern, SitePath};
pub use pattern::{Params, RoutePattern};
