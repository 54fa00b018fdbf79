//! Deterministic mutation of unified diffs.
//!
//! Rewrites selected added lines of a parsed patch to inject
//! policy-violating constructs while keeping the diff structurally valid.
//! Selection is two-phase: a kind-specific predicate pass over candidates in
//! diff order, then a generic fallback insertion when the primary pass
//! selected nothing, guaranteeing a nonzero mutation count whenever any
//! policy-eligible added line exists.

pub mod engine;
pub mod templates;

pub use engine::{mutate, MutationOutcome, MutationRecord};
pub use templates::TemplateSet;
