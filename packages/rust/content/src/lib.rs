//! HTML content passes used when preparing a page for rendering.
//!
//! - [`toc`]: heading scan, anchor injection and table-of-contents building
//! - [`text`]: markup stripping and excerpts for meta descriptions

pub mod text;
pub mod toc;

pub use text::{excerpt, strip_markup};
pub use toc::{Extraction, TOC_THRESHOLD, extract};
