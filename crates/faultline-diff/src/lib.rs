//! Unified diff parsing and re-serialization.
//!
//! Parses a unified diff into a structured [`Patch`] of files, hunks, and
//! origin-tagged lines, and serializes it back with hunk headers recomputed
//! from the actual line counts. Strict parsing rejects hunks whose declared
//! counts cannot be reconciled; lenient parsing accepts them with warnings,
//! since benchmark corpora contain real-world malformed diffs.

pub mod model;
pub mod parser;

pub use model::{FileDiff, Hunk, Line, LineOrigin, ParseWarning, Patch};
