use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin of a diff line within a hunk.
///
/// # Examples
///
/// ```
/// use faultline_diff::LineOrigin;
///
/// assert_eq!(LineOrigin::Added.marker(), '+');
/// assert_eq!(LineOrigin::Context.marker(), ' ');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrigin {
    /// Unchanged line present in both versions.
    Context,
    /// Line introduced by the patch.
    Added,
    /// Line removed by the patch.
    Removed,
}

impl LineOrigin {
    /// The leading marker character for this origin in unified diff text.
    pub fn marker(self) -> char {
        match self {
            LineOrigin::Context => ' ',
            LineOrigin::Added => '+',
            LineOrigin::Removed => '-',
        }
    }
}

/// A single line of a hunk.
///
/// `text` holds the raw content without the leading marker and without a
/// trailing newline; `has_newline` is false only for the line immediately
/// before a `\ No newline at end of file` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Where this line comes from.
    pub origin: LineOrigin,
    /// Raw content, marker and newline stripped. CRLF input keeps its `\r`.
    pub text: String,
    /// Whether the line ends with a newline in the patched file.
    pub has_newline: bool,
}

impl Line {
    /// Construct a line with a trailing newline (the common case).
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_diff::{Line, LineOrigin};
    ///
    /// let line = Line::new(LineOrigin::Added, "let x = 1;");
    /// assert!(line.has_newline);
    /// ```
    pub fn new(origin: LineOrigin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
            has_newline: true,
        }
    }
}

/// A contiguous block of a unified diff covering one region of a file.
///
/// The header counts are those declared in the source text; after lenient
/// parsing or mutation they are reconciled with the observed lines, and
/// serialization always recomputes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Starting line in the old version.
    pub old_start: u32,
    /// Number of old-side lines (context + removed).
    pub old_count: u32,
    /// Starting line in the new version.
    pub new_start: u32,
    /// Number of new-side lines (context + added).
    pub new_count: u32,
    /// Ordered lines of the hunk.
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Old-side line count observed from the actual lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_diff::{Hunk, Line, LineOrigin};
    ///
    /// let hunk = Hunk {
    ///     old_start: 1,
    ///     old_count: 1,
    ///     new_start: 1,
    ///     new_count: 2,
    ///     lines: vec![
    ///         Line::new(LineOrigin::Context, "fn main() {"),
    ///         Line::new(LineOrigin::Added, "    run();"),
    ///     ],
    /// };
    /// assert_eq!(hunk.observed_old_count(), 1);
    /// assert_eq!(hunk.observed_new_count(), 2);
    /// ```
    pub fn observed_old_count(&self) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.origin != LineOrigin::Added)
            .count() as u32
    }

    /// New-side line count observed from the actual lines.
    pub fn observed_new_count(&self) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.origin != LineOrigin::Removed)
            .count() as u32
    }

    /// Reconcile the declared header counts with the observed lines.
    pub fn recount(&mut self) {
        self.old_count = self.observed_old_count();
        self.new_count = self.observed_new_count();
    }
}

/// A complete diff for a single file, containing one or more hunks.
///
/// Files without hunks (rename-only or binary entries) are dropped during
/// parsing, so every `FileDiff` in a [`Patch`] carries at least one hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path in the old version, `a/` prefix and quotes stripped.
    pub old_path: String,
    /// Path in the new version, `b/` prefix and quotes stripped.
    pub new_path: String,
    /// Whether this is a newly created file.
    pub is_new_file: bool,
    /// Whether this file was deleted.
    pub is_deleted_file: bool,
    /// Parsed hunks for this file.
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// The path this diff is about: the new path, unless the file was
    /// deleted, in which case the old path.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_diff::Patch;
    ///
    /// let diff = "\
    /// --- a/src/lib.rs
    /// +++ b/src/lib.rs
    /// @@ -1 +1,2 @@
    ///  fn f() {}
    /// +fn g() {}
    /// ";
    /// let patch = Patch::parse(diff).unwrap();
    /// assert_eq!(patch.files[0].path(), "src/lib.rs");
    /// ```
    pub fn path(&self) -> &str {
        if self.is_deleted_file {
            &self.old_path
        } else {
            &self.new_path
        }
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hunks)", self.path(), self.hunks.len())
    }
}

/// A warning recorded during lenient parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Path of the file the warning applies to.
    pub file: String,
    /// Index of the hunk within that file.
    pub hunk_index: usize,
    /// What could not be reconciled.
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hunk {}: {}", self.file, self.hunk_index, self.message)
    }
}

/// A parsed unified diff: an ordered sequence of file diffs.
///
/// Constructed fresh per invocation from an immutable input string; mutation
/// always produces a new `Patch` so the original stays available for
/// gold-vs-mutant comparison.
///
/// # Examples
///
/// ```
/// use faultline_diff::Patch;
///
/// let diff = "\
/// diff --git a/hello.rs b/hello.rs
/// --- a/hello.rs
/// +++ b/hello.rs
/// @@ -1,3 +1,4 @@
///  fn main() {
/// +    println!(\"hello\");
///      let x = 1;
///  }
/// ";
/// let patch = Patch::parse(diff).unwrap();
/// assert_eq!(patch.files.len(), 1);
/// assert_eq!(patch.files[0].hunks.len(), 1);
/// assert!(patch.warnings.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Parsed file diffs, in input order.
    pub files: Vec<FileDiff>,
    /// Warnings collected during lenient parsing; always empty after a
    /// strict parse.
    pub warnings: Vec<ParseWarning>,
}

impl Patch {
    /// Parse a unified diff, rejecting hunks whose declared counts do not
    /// match the lines that follow.
    ///
    /// # Errors
    ///
    /// Returns [`FaultlineError::MalformedDiff`] on an unparseable hunk
    /// header or a count mismatch.
    ///
    /// [`FaultlineError::MalformedDiff`]: faultline_core::FaultlineError::MalformedDiff
    pub fn parse(input: &str) -> faultline_core::Result<Self> {
        crate::parser::parse_unified_diff(input, false)
    }

    /// Parse a unified diff, accepting count mismatches with a best-effort
    /// line attribution and a warning on the result.
    ///
    /// Hunk headers are recomputed from the observed lines so the returned
    /// patch serializes to a self-consistent diff.
    ///
    /// # Errors
    ///
    /// Returns [`FaultlineError::MalformedDiff`] only for structurally
    /// unparseable hunk headers; count mismatches become warnings.
    ///
    /// [`FaultlineError::MalformedDiff`]: faultline_core::FaultlineError::MalformedDiff
    pub fn parse_lenient(input: &str) -> faultline_core::Result<Self> {
        crate::parser::parse_unified_diff(input, true)
    }

    /// True when the patch contains no file diffs.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize back to unified diff text.
    ///
    /// Hunk headers are recomputed from the actual line counts, not the
    /// original header, so a mutated patch serializes consistently.
    /// Newline-at-EOF fidelity is preserved through the per-line flag.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_diff::Patch;
    ///
    /// let diff = "\
    /// diff --git a/f.rs b/f.rs
    /// --- a/f.rs
    /// +++ b/f.rs
    /// @@ -1 +1,2 @@
    ///  old
    /// +new
    /// ";
    /// let patch = Patch::parse(diff).unwrap();
    /// let text = patch.to_unified();
    /// let reparsed = Patch::parse(&text).unwrap();
    /// assert_eq!(patch.files, reparsed.files);
    /// ```
    pub fn to_unified(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let a_path = if file.is_new_file {
                &file.new_path
            } else {
                &file.old_path
            };
            let b_path = if file.is_deleted_file {
                &file.old_path
            } else {
                &file.new_path
            };
            out.push_str(&format!("diff --git a/{a_path} b/{b_path}\n"));
            if file.is_new_file {
                out.push_str("new file mode 100644\n");
            }
            if file.is_deleted_file {
                out.push_str("deleted file mode 100644\n");
            }
            if file.is_new_file {
                out.push_str("--- /dev/null\n");
            } else {
                out.push_str(&format!("--- a/{}\n", file.old_path));
            }
            if file.is_deleted_file {
                out.push_str("+++ /dev/null\n");
            } else {
                out.push_str(&format!("+++ b/{}\n", file.new_path));
            }
            for hunk in &file.hunks {
                out.push_str(&format!(
                    "@@ -{},{} +{},{} @@\n",
                    hunk.old_start,
                    hunk.observed_old_count(),
                    hunk.new_start,
                    hunk.observed_new_count(),
                ));
                for line in &hunk.lines {
                    out.push(line.origin.marker());
                    out.push_str(&line.text);
                    out.push('\n');
                    if !line.has_newline {
                        out.push_str("\\ No newline at end of file\n");
                    }
                }
            }
        }
        out
    }
}
