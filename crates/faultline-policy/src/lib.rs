//! Policy classification and counting over parsed diffs.
//!
//! Decides which file paths are subject to policy (production source, not
//! test/bench scaffolding), which added lines contain policy-relevant
//! patterns, and accumulates per-pattern counts restricted to added lines.
//! Matching is textual by design; the [`LineClassifier`] interface is narrow
//! enough that a real tokenizer could replace it without touching the diff
//! or mutation contracts.

pub mod classifier;
pub mod counter;

pub use classifier::LineClassifier;
pub use counter::{count, find_matches, PatternMatch, PolicyCounts};
