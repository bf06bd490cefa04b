//! Digest output formats.
//!
//! # Submodules
//!
//! - [`html`]: Renders the digest document and writes it to disk
//! - [`json`]: Archives the articles of a run as JSON
//!
//! # Output Structure
//!
//! ```text
//! --html-output digest.html     # rendered digest, same body as the email
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 080000.json           # RunArchive
//! ```

pub mod html;
pub mod json;
