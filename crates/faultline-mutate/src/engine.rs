use faultline_core::{FaultlineError, MutationKind, MutationStyle, Result};
use faultline_diff::{Hunk, Line, LineOrigin, Patch};
use faultline_policy::LineClassifier;
use serde::{Deserialize, Serialize};

use crate::templates::{leading_ws, TemplateSet};

/// Result of a mutation run, holding the mutated patch in structured form.
///
/// Use [`to_record`](MutationOutcome::to_record) to serialize for the
/// analysis pipeline.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The mutation kind that was applied.
    pub kind: MutationKind,
    /// The strength profile that was applied.
    pub style: MutationStyle,
    /// How many lines were rewritten or inserted.
    pub mutation_count: u32,
    /// The mutated patch; the input patch is never modified.
    pub patch: Patch,
}

impl MutationOutcome {
    /// Serialize into the flat record consumed by downstream analysis.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_core::{MutationKind, MutationStyle};
    /// use faultline_diff::Patch;
    /// use faultline_mutate::{mutate, TemplateSet};
    /// use faultline_policy::LineClassifier;
    ///
    /// let diff = "\
    /// --- a/src/lib.rs
    /// +++ b/src/lib.rs
    /// @@ -1 +1,2 @@
    ///  fn f() {}
    /// +let x = load()?;
    /// ";
    /// let patch = Patch::parse(diff).unwrap();
    /// let outcome = mutate(
    ///     &patch,
    ///     MutationKind::Unwrap,
    ///     MutationStyle::Heuristic,
    ///     &LineClassifier::default_classifier(),
    ///     &TemplateSet::for_version(1).unwrap(),
    /// )
    /// .unwrap();
    /// let record = outcome.to_record();
    /// assert_eq!(record.mutation_count, 1);
    /// assert!(record.mutated_diff.contains("load().unwrap()"));
    /// ```
    pub fn to_record(&self) -> MutationRecord {
        MutationRecord {
            kind: self.kind,
            style: self.style,
            mutation_count: self.mutation_count,
            mutated_diff: self.patch.to_unified(),
        }
    }
}

/// Flat mutation record: `{kind, style, mutation_count, mutated_diff}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// The mutation kind that was applied.
    pub kind: MutationKind,
    /// The strength profile that was applied.
    pub style: MutationStyle,
    /// How many lines were rewritten or inserted.
    pub mutation_count: u32,
    /// The mutated diff, serialized back to unified diff text.
    pub mutated_diff: String,
}

/// Mutate a parsed patch, injecting the requested policy violation.
///
/// Candidates are the added lines of policy-eligible files, visited in diff
/// order. Selection is two-phase: the kind-specific predicate pass rewrites
/// the first matching candidate; if nothing matched, the fallback pass
/// inserts one generic line carrying the pattern next to the first
/// candidate, so the mutation count is at least one whenever a candidate
/// exists. Given identical inputs the output is byte-identical.
///
/// The input patch is never modified; the outcome holds a new one.
///
/// # Errors
///
/// - [`FaultlineError::NoEligibleLines`] when the diff contains no added
///   line in any policy-eligible file.
/// - [`FaultlineError::UnsupportedPattern`] for `gs` with the adversarial
///   style.
///
/// # Examples
///
/// ```
/// use faultline_core::{MutationKind, MutationStyle};
/// use faultline_diff::Patch;
/// use faultline_mutate::{mutate, TemplateSet};
/// use faultline_policy::LineClassifier;
///
/// let diff = "\
/// --- a/src/lib.rs
/// +++ b/src/lib.rs
/// @@ -1 +1,2 @@
///  fn f() {}
/// +    let y = 5;
/// ";
/// let patch = Patch::parse(diff).unwrap();
/// let outcome = mutate(
///     &patch,
///     MutationKind::Unsafe,
///     MutationStyle::Heuristic,
///     &LineClassifier::default_classifier(),
///     &TemplateSet::for_version(1).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(outcome.mutation_count, 1);
/// ```
pub fn mutate(
    patch: &Patch,
    kind: MutationKind,
    style: MutationStyle,
    classifier: &LineClassifier,
    templates: &TemplateSet,
) -> Result<MutationOutcome> {
    if kind == MutationKind::Gold {
        if style == MutationStyle::Adversarial {
            return Err(FaultlineError::UnsupportedPattern {
                kind: kind.to_string(),
                style: style.to_string(),
            });
        }
        return Ok(MutationOutcome {
            kind,
            style,
            mutation_count: 0,
            patch: patch.clone(),
        });
    }

    if !has_eligible_added_line(patch, classifier) {
        return Err(FaultlineError::NoEligibleLines);
    }

    let mut mutated = patch.clone();
    let mut count = primary_pass(&mut mutated, kind, style, classifier, templates);
    if count == 0 {
        count = fallback_pass(&mut mutated, kind, classifier, templates);
    }

    Ok(MutationOutcome {
        kind,
        style,
        mutation_count: count,
        patch: mutated,
    })
}

fn has_eligible_added_line(patch: &Patch, classifier: &LineClassifier) -> bool {
    patch
        .files
        .iter()
        .filter(|f| classifier.is_policy_eligible(f.path()))
        .flat_map(|f| f.hunks.iter())
        .flat_map(|h| h.lines.iter())
        .any(|l| l.origin == LineOrigin::Added)
}

/// Rewrite the first added line satisfying the kind's predicate.
fn primary_pass(
    patch: &mut Patch,
    kind: MutationKind,
    style: MutationStyle,
    classifier: &LineClassifier,
    templates: &TemplateSet,
) -> u32 {
    for file in &mut patch.files {
        if !classifier.is_policy_eligible(file.path()) {
            continue;
        }
        for hunk in &mut file.hunks {
            for idx in 0..hunk.lines.len() {
                if hunk.lines[idx].origin != LineOrigin::Added {
                    continue;
                }
                if let Some(replacement) = templates.rewrite(kind, style, &hunk.lines[idx].text) {
                    replace_line(hunk, idx, replacement);
                    return 1;
                }
            }
        }
    }
    0
}

/// Insert one generic pattern-carrying line next to the first candidate.
///
/// Prefers a non-blank, non-comment anchor so the injected line lands in
/// statement position; falls back to the first added line outright.
fn fallback_pass(
    patch: &mut Patch,
    kind: MutationKind,
    classifier: &LineClassifier,
    templates: &TemplateSet,
) -> u32 {
    let Some((file_idx, hunk_idx, line_idx)) = find_fallback_anchor(patch, classifier) else {
        return 0;
    };

    let hunk = &mut patch.files[file_idx].hunks[hunk_idx];
    let anchor = &hunk.lines[line_idx];
    let indent = leading_ws(&anchor.text).to_string();
    let Some(text) = templates.fallback_line(kind, &indent) else {
        return 0;
    };

    // Keep the no-newline marker on the true last line: when the anchor
    // lacks a trailing newline the injected line goes before it.
    let insert_at = if anchor.has_newline {
        line_idx + 1
    } else {
        line_idx
    };
    hunk.lines
        .insert(insert_at, Line::new(LineOrigin::Added, text));
    hunk.recount();
    1
}

fn find_fallback_anchor(
    patch: &Patch,
    classifier: &LineClassifier,
) -> Option<(usize, usize, usize)> {
    let mut first_added: Option<(usize, usize, usize)> = None;

    for (file_idx, file) in patch.files.iter().enumerate() {
        if !classifier.is_policy_eligible(file.path()) {
            continue;
        }
        for (hunk_idx, hunk) in file.hunks.iter().enumerate() {
            for (line_idx, line) in hunk.lines.iter().enumerate() {
                if line.origin != LineOrigin::Added {
                    continue;
                }
                if first_added.is_none() {
                    first_added = Some((file_idx, hunk_idx, line_idx));
                }
                let stripped = line.text.trim();
                if !stripped.is_empty() && !stripped.starts_with("//") {
                    return Some((file_idx, hunk_idx, line_idx));
                }
            }
        }
    }

    first_added
}

fn replace_line(hunk: &mut Hunk, idx: usize, replacement: Vec<String>) {
    let original = hunk.lines.remove(idx);
    let last = replacement.len().saturating_sub(1);
    for (i, text) in replacement.into_iter().enumerate() {
        hunk.lines.insert(
            idx + i,
            Line {
                origin: LineOrigin::Added,
                text,
                has_newline: if i == last { original.has_newline } else { true },
            },
        );
    }
    hunk.recount();
}
