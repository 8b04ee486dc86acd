//! Durable artifacts produced by a run.
//!
//! # Submodules
//!
//! - [`history`]: The accumulated record history, read at start and written
//!   at most once per run
//! - [`html`]: The static report, rewritten on every run
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── history.json   # every record ever accepted
//! index.html         # self-contained report
//! ```

pub mod history;
pub mod html;
