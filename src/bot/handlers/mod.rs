//! Discord interaction handlers
//!
//! This module provides the handlers that are not commands themselves:
//! autocomplete, framework errors, gateway events and prefix matching.

/// Autocomplete handlers for language and command names
pub mod autocomplete;
/// Framework error replies and error-channel reports
pub mod errors;
/// Gateway events and command logging
pub mod events;
/// Per-guild prefix matching
pub mod prefix;
