//! Pipeline stages for Obsidian-to-HTML conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! raw note ──▶ dialect ──▶ render ──▶ restore ──▶ anchors (TOC) ──▶ document
//!              (+callout)  (comrak)                                          (HTML5 shell)
//! ```
//!
//! 1. [`dialect`]: strip front-matter, flatten links, strip tag markers,
//!    render callouts and hold them aside behind placeholders
//! 2. [`callout`]: parse `> [!type] title` blocks and render them to HTML
//! 3. [`render`]: CommonMark + tables via comrak, syntect highlighting
//! 4. [`anchors`]: unique heading ids and the `[TOC]` list
//! 5. [`document`]: wrap the fragment in a minimal HTML5 document
//!
//! [`input`] sits beside the per-note stages: it walks the vault and decides
//! which files are notes and which are copied as-is.

pub mod anchors;
pub mod callout;
pub mod dialect;
pub mod document;
pub mod input;
pub mod render;
