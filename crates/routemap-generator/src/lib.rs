//! routemap Generator Library
//!
//! Derives crawler-facing artifacts from a site's route list.
//!
//! # Modules
//!
//! - [`classify`] - Priority and change frequency assignment
//! - [`exclude`] - Sitemap exclusion filter
//! - [`policy`] - Redirects, response headers and embed policy
//! - [`collector`] - Route enumeration from files or a static export
//! - [`sitemap`] - XML sitemap generation
//! - [`robots`] - robots.txt generation
//! - [`build`] - Build orchestration

pub mod build;
pub mod classify;
pub mod collector;
pub mod exclude;
pub mod policy;
pub mod robots;
pub mod sitemap;

pub use build::{BuildStats, Builder, Plan, plan};
pub use classify::{Bucket, Classification, MetadataEngine};
pub use collector::{RouteCollector, RouteSource};
pub use exclude::ExclusionFilter;
pub use policy::{EmbedPolicy, Rewrite, RoutePolicy};
pub use robots::{RobotsGenerator, is_crawl_allowed};
pub use sitemap::{SitemapEntry, SitemapGenerator};
