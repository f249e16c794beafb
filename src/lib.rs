// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11yscan - rule-driven accessibility analysis
//!
//! Teams declare accessibility rules as JSON or flat `key: value` YAML
//! files; each rule binds to one built-in check. a11yscan runs those rules
//! over captured documents or whole source trees (HTML, Razor/CSHTML,
//! FreeMarker, XAML, CSS and script files carrying embedded markup) and
//! aggregates the resulting issues into reports.
//!
//! ## Modules
//!
//! - [`rules`]: rule corpus loading and validation
//! - [`context`]: evaluable views of a document (templates, snippets, stylesheets)
//! - [`checks`]: the check registry and every built-in check
//! - [`scanner`]: single-document and directory-tree scanning
//! - [`report`]: aggregation by rule, file, team, severity and check

pub mod checks;
pub mod config;
pub mod context;
pub mod error;
pub mod markup;
pub mod model;
pub mod report;
pub mod rules;
pub mod scanner;

pub use error::{Result, ScanError};
