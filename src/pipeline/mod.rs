//! Pipeline stages for stamping a header onto a PDF cover page.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own without building a whole document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ layout ──▶ encoding ──▶ overlay
//! (path/URL)  (lopdf)     (points)   (CP1252)    (page 1)
//! ```
//!
//! 1. [`input`]    — read a local file or download a URL; check `%PDF`
//! 2. [`document`] — parse with lopdf, reject encrypted input, read metadata
//! 3. [`layout`]   — expand the template for one recipient and place lines
//! 4. [`encoding`] — UTF-8 → WinAnsiEncoding bytes for the standard fonts
//! 5. [`overlay`]  — register fonts and append the header content stream
//!
//! Stages 2–5 are synchronous and CPU-bound; callers run them inside
//! `spawn_blocking`.

pub mod document;
pub mod encoding;
pub mod input;
pub mod layout;
pub mod overlay;
