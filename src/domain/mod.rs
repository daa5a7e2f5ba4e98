//! Backend-independent data model.
//!
//! Geometry, colours and structured page text. Nothing here knows about
//! PDF objects; the [`crate::pdf`] backend produces these types and the
//! replacement strategies consume them.

pub mod color;
pub mod geometry;
pub mod text;

pub use color::{normalize_color, ColorValue, Rgb};
pub use geometry::{Matrix, Point, Rect};
pub use text::{blocks_to_text, CharBox, TextBlock, TextLine, TextSpan};
