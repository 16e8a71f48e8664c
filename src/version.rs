// Package identity baked in at build time (reported by GET /version)

pub const NAME: &str = env!("CARGO_PKG_NAME");

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
