use faultline_core::PatternKind;
use faultline_diff::{LineOrigin, Patch};
use serde::{Deserialize, Serialize};

use crate::classifier::LineClassifier;

/// One policy-relevant pattern found on an added line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    /// Which pattern matched.
    pub pattern: PatternKind,
    /// Path of the file the line belongs to.
    pub file_path: String,
    /// Index of the hunk within the file.
    pub hunk_index: usize,
    /// Position of the line within the hunk.
    pub line_index: usize,
    /// The token that matched.
    pub matched_text: String,
}

/// Per-pattern totals over the added lines of policy-eligible files.
///
/// Serializes with the field names the analysis pipeline expects:
/// `{unwrap, unsafe, panic, unsafe_without_safety_comment}`.
///
/// # Examples
///
/// ```
/// use faultline_policy::PolicyCounts;
///
/// let counts = PolicyCounts::default();
/// let json = serde_json::to_value(&counts).unwrap();
/// assert_eq!(json["unsafe"], 0);
/// assert_eq!(json["unsafe_without_safety_comment"], 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCounts {
    /// `.unwrap(` / `.expect(` call sites.
    pub unwrap: u64,
    /// `unsafe` block openers.
    #[serde(rename = "unsafe")]
    pub unsafe_blocks: u64,
    /// `panic!` invocations.
    pub panic: u64,
    /// `unsafe` matches with no safety comment in the preceding window.
    pub unsafe_without_safety_comment: u64,
}

impl PolicyCounts {
    /// True when no pattern was counted at all.
    pub fn is_zero(&self) -> bool {
        self.unwrap == 0 && self.unsafe_blocks == 0 && self.panic == 0
    }
}

/// Count policy patterns over the added lines of policy-eligible files.
///
/// Removed and context lines never contribute: policy violations are about
/// newly introduced code, not pre-existing code the patch does not touch.
/// An empty eligible-line set yields all-zero counts, not an error.
///
/// # Examples
///
/// ```
/// use faultline_diff::Patch;
/// use faultline_policy::{count, LineClassifier};
///
/// let diff = "\
/// --- a/src/lib.rs
/// +++ b/src/lib.rs
/// @@ -1 +1,2 @@
///  fn f() {}
/// +fn g() { maybe().unwrap(); }
/// ";
/// let patch = Patch::parse(diff).unwrap();
/// let counts = count(&patch, &LineClassifier::default_classifier());
/// assert_eq!(counts.unwrap, 1);
/// assert_eq!(counts.panic, 0);
/// ```
pub fn count(patch: &Patch, classifier: &LineClassifier) -> PolicyCounts {
    let mut counts = PolicyCounts::default();

    for m in find_matches(patch, classifier) {
        match m.pattern {
            PatternKind::UnwrapExpect => counts.unwrap += 1,
            PatternKind::Unsafe => counts.unsafe_blocks += 1,
            PatternKind::Panic => counts.panic += 1,
        }
    }

    counts.unsafe_without_safety_comment =
        count_unsafe_without_safety_comment(patch, classifier);

    counts
}

/// Collect the individual pattern matches behind [`count`].
///
/// Matches are reported in diff order with their hunk-relative line index,
/// which makes them directly addressable for reporting.
pub fn find_matches(patch: &Patch, classifier: &LineClassifier) -> Vec<PatternMatch> {
    let mut matches = Vec::new();

    for file in &patch.files {
        let path = file.path();
        if !classifier.is_policy_eligible(path) {
            continue;
        }
        for (hunk_index, hunk) in file.hunks.iter().enumerate() {
            for (line_index, line) in hunk.lines.iter().enumerate() {
                if line.origin != LineOrigin::Added {
                    continue;
                }
                for pattern in classifier.match_patterns(&line.text) {
                    matches.push(PatternMatch {
                        pattern,
                        file_path: path.to_string(),
                        hunk_index,
                        line_index,
                        matched_text: matched_token(pattern, &line.text),
                    });
                }
            }
        }
    }

    matches
}

fn matched_token(pattern: PatternKind, line: &str) -> String {
    match pattern {
        PatternKind::UnwrapExpect => {
            if line.contains(".unwrap(") {
                ".unwrap(".to_string()
            } else {
                ".expect(".to_string()
            }
        }
        PatternKind::Unsafe => "unsafe".to_string(),
        PatternKind::Panic => "panic!".to_string(),
    }
}

fn count_unsafe_without_safety_comment(patch: &Patch, classifier: &LineClassifier) -> u64 {
    let mut count = 0;

    for file in &patch.files {
        if !classifier.is_policy_eligible(file.path()) {
            continue;
        }
        for hunk in &file.hunks {
            for (line_index, line) in hunk.lines.iter().enumerate() {
                if line.origin != LineOrigin::Added {
                    continue;
                }
                if !classifier
                    .match_patterns(&line.text)
                    .contains(&PatternKind::Unsafe)
                {
                    continue;
                }
                // The justification window is what precedes the line in the
                // patched file: context and added lines, never removed ones.
                let window: Vec<&str> = hunk.lines[..line_index]
                    .iter()
                    .filter(|l| l.origin != LineOrigin::Removed)
                    .map(|l| l.text.as_str())
                    .collect();
                if !classifier.has_safety_comment(&window) {
                    count += 1;
                }
            }
        }
    }

    count
}
