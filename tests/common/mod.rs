//! Common test utilities and helpers.
//!
//! - Custom assertions
//! - Fixture builders (lopdf for exact span geometry, printpdf for
//!   multi-page documents)
//! - PDF inspection helpers

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod pdf_helpers;

pub use assertions::*;
pub use fixtures::*;
pub use pdf_helpers::*;
