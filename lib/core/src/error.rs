//! Error handling foundation for hyperprov.
//!
//! Each crate defines its own domain error enums in its `error` module. Setup
//! paths that benefit from layered context (transport construction, config
//! loading) report through rootcause and add context with `.context()` as the
//! error rises.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
