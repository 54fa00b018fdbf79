use faultline_core::{FaultlineError, Result};

use crate::model::{FileDiff, Hunk, Line, LineOrigin, ParseWarning, Patch};

/// Parse a unified diff string (as produced by `git diff`) into a [`Patch`].
///
/// Handles standard unified diff format including new files, deleted files,
/// renamed files (dropped when they carry no hunks), binary files (skipped),
/// quoted paths, and patches that lack the `diff --git` command line.
///
/// In strict mode (`lenient == false`) a hunk whose declared counts cannot
/// be reconciled with the lines that follow is a [`FaultlineError::MalformedDiff`].
/// In lenient mode the hunk is accepted as observed, its header counts are
/// recomputed, and a [`ParseWarning`] is recorded on the patch.
pub(crate) fn parse_unified_diff(input: &str, lenient: bool) -> Result<Patch> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut current_hunk: Option<Hunk> = None;
    let mut is_binary = false;

    for line in input.lines() {
        if line == "\\ No newline at end of file" {
            if let Some(last) = current_hunk.as_mut().and_then(|h| h.lines.last_mut()) {
                last.has_newline = false;
            }
            continue;
        }

        // While the open hunk still expects lines, marker classification wins
        // over header detection; a removed line starting with "---" is content
        // here, not a file boundary.
        if let Some(hunk) = current_hunk.as_mut() {
            if hunk_incomplete(hunk) {
                if let Some(parsed) = classify_line(line) {
                    hunk.lines.push(parsed);
                    continue;
                }
                if line.is_empty() {
                    // Some tools emit blank context lines without the
                    // leading space.
                    hunk.lines.push(Line::new(LineOrigin::Context, ""));
                    continue;
                }
                // Anything else terminates the hunk early; fall through so
                // the close below sees the mismatch.
            }
        }

        if line.starts_with("diff --git ") {
            close_hunk(&mut current, &mut current_hunk, lenient, &mut warnings)?;
            push_file(&mut files, current.take(), is_binary);
            is_binary = false;
            current = Some(new_file_diff());
            continue;
        }

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            is_binary = true;
            continue;
        }

        if let Some(rest) = line.strip_prefix("--- ") {
            close_hunk(&mut current, &mut current_hunk, lenient, &mut warnings)?;
            // A bare "---" header either starts a file implicitly (standard
            // patches without the git command line) or begins the next file
            // in a concatenated patch.
            let start_fresh = match current.as_ref() {
                None => true,
                Some(file) => !file.hunks.is_empty(),
            };
            if start_fresh {
                push_file(&mut files, current.take(), is_binary);
                is_binary = false;
                current = Some(new_file_diff());
            }
            let file = current.as_mut().unwrap();
            file.old_path = parse_path(rest);
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("new file mode") {
            file.is_new_file = true;
            continue;
        }

        if line.starts_with("deleted file mode") {
            file.is_deleted_file = true;
            continue;
        }

        if line.starts_with("rename from ")
            || line.starts_with("rename to ")
            || line.starts_with("similarity index")
            || line.starts_with("index ")
            || line.starts_with("old mode")
            || line.starts_with("new mode")
        {
            continue;
        }

        if let Some(rest) = line.strip_prefix("+++ ") {
            file.new_path = parse_path(rest);
            if rest.trim_matches('"') == "/dev/null" {
                file.is_deleted_file = true;
            }
            continue;
        }

        if line.starts_with("@@ ") {
            close_hunk(&mut current, &mut current_hunk, lenient, &mut warnings)?;
            let file = current.as_mut().unwrap();
            if file.old_path == "/dev/null" {
                file.is_new_file = true;
            }
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(line)?;
            current_hunk = Some(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            continue;
        }

        // A surplus content line after the open hunk's declared counts are
        // already satisfied; keep it so the close detects the mismatch.
        if let Some(hunk) = current_hunk.as_mut() {
            if let Some(parsed) = classify_line(line) {
                hunk.lines.push(parsed);
            }
        }
    }

    close_hunk(&mut current, &mut current_hunk, lenient, &mut warnings)?;
    push_file(&mut files, current.take(), is_binary);

    Ok(Patch { files, warnings })
}

fn new_file_diff() -> FileDiff {
    FileDiff {
        old_path: String::new(),
        new_path: String::new(),
        is_new_file: false,
        is_deleted_file: false,
        hunks: Vec::new(),
    }
}

fn hunk_incomplete(hunk: &Hunk) -> bool {
    hunk.observed_old_count() < hunk.old_count || hunk.observed_new_count() < hunk.new_count
}

fn classify_line(line: &str) -> Option<Line> {
    let mut chars = line.chars();
    let origin = match chars.next()? {
        '+' => LineOrigin::Added,
        '-' => LineOrigin::Removed,
        ' ' => LineOrigin::Context,
        _ => return None,
    };
    Some(Line::new(origin, chars.as_str()))
}

fn close_hunk(
    current: &mut Option<FileDiff>,
    hunk: &mut Option<Hunk>,
    lenient: bool,
    warnings: &mut Vec<ParseWarning>,
) -> Result<()> {
    let Some(mut h) = hunk.take() else {
        return Ok(());
    };
    let Some(file) = current.as_mut() else {
        return Ok(());
    };

    let observed_old = h.observed_old_count();
    let observed_new = h.observed_new_count();
    if observed_old != h.old_count || observed_new != h.new_count {
        let message = format!(
            "header declares -{},{} +{},{} but lines give {} old-side and {} new-side",
            h.old_start, h.old_count, h.new_start, h.new_count, observed_old, observed_new,
        );
        if !lenient {
            return Err(FaultlineError::MalformedDiff(format!(
                "{} hunk {}: {}",
                file.path(),
                file.hunks.len(),
                message
            )));
        }
        warnings.push(ParseWarning {
            file: file.path().to_string(),
            hunk_index: file.hunks.len(),
            message,
        });
        h.recount();
    }
    file.hunks.push(h);
    Ok(())
}

fn push_file(files: &mut Vec<FileDiff>, file: Option<FileDiff>, is_binary: bool) {
    if let Some(file) = file {
        // Binary entries and hunk-less files (rename-only, mode-only) carry
        // nothing to analyze or mutate.
        if !is_binary && !file.hunks.is_empty() {
            files.push(file);
        }
    }
}

fn parse_path(raw: &str) -> String {
    let normalized = raw.trim_matches('"');

    if normalized == "/dev/null" {
        return "/dev/null".to_string();
    }

    normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized)
        .to_string()
}

fn parse_hunk_header(line: &str) -> Result<(u32, u32, u32, u32)> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| FaultlineError::MalformedDiff(format!("invalid hunk header: {line}")))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 {
        return Err(FaultlineError::MalformedDiff(format!(
            "invalid hunk header: {line}"
        )));
    }

    let old = parts[0].strip_prefix('-').ok_or_else(|| {
        FaultlineError::MalformedDiff(format!("invalid old range in hunk: {line}"))
    })?;
    let new = parts[1].strip_prefix('+').ok_or_else(|| {
        FaultlineError::MalformedDiff(format!("invalid new range in hunk: {line}"))
    })?;

    let (old_start, old_count) = parse_range(old, line)?;
    let (new_start, new_count) = parse_range(new, line)?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32)> {
    if let Some((start, count)) = range.split_once(',') {
        let s = start.parse().map_err(|_| {
            FaultlineError::MalformedDiff(format!("invalid range number in: {context}"))
        })?;
        let c = count.parse().map_err(|_| {
            FaultlineError::MalformedDiff(format!("invalid range count in: {context}"))
        })?;
        Ok((s, c))
    } else {
        let s = range.parse().map_err(|_| {
            FaultlineError::MalformedDiff(format!("invalid range number in: {context}"))
        })?;
        Ok((s, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_returns_empty_patch() {
        let patch = Patch::parse("").unwrap();
        assert!(patch.is_empty());
        assert!(patch.warnings.is_empty());
    }

    #[test]
    fn single_file_single_hunk() {
        let diff = "\
diff --git a/src/main.rs b/src/main.rs
index abc1234..def5678 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"hello\");
     let x = 1;
 }
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert_eq!(patch.files[0].new_path, "src/main.rs");
        assert_eq!(patch.files[0].hunks.len(), 1);
        let hunk = &patch.files[0].hunks[0];
        assert_eq!(hunk.old_start, 1);
        assert_eq!(hunk.old_count, 3);
        assert_eq!(hunk.new_start, 1);
        assert_eq!(hunk.new_count, 4);
        assert_eq!(hunk.lines.len(), 4);
        assert_eq!(hunk.lines[1].origin, LineOrigin::Added);
        assert_eq!(hunk.lines[1].text, "    println!(\"hello\");");
    }

    #[test]
    fn single_file_multiple_hunks() {
        let diff = "\
diff --git a/lib.rs b/lib.rs
--- a/lib.rs
+++ b/lib.rs
@@ -1,2 +1,3 @@
 fn foo() {
+    bar();
 }
@@ -10,2 +11,3 @@
 fn baz() {
+    qux();
 }
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert_eq!(patch.files[0].hunks.len(), 2);
        assert_eq!(patch.files[0].hunks[0].old_start, 1);
        assert_eq!(patch.files[0].hunks[1].old_start, 10);
    }

    #[test]
    fn multiple_files() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1,2 @@
 line1
+line2
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 2);
        assert_eq!(patch.files[0].new_path, "a.rs");
        assert_eq!(patch.files[1].new_path, "b.rs");
    }

    #[test]
    fn concatenated_patches_without_git_header() {
        let diff = "\
--- a/x.rs
+++ b/x.rs
@@ -1 +1,2 @@
 one
+two
--- a/y.rs
+++ b/y.rs
@@ -1 +1,2 @@
 one
+two
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 2);
        assert_eq!(patch.files[0].new_path, "x.rs");
        assert_eq!(patch.files[1].new_path, "y.rs");
    }

    #[test]
    fn new_file() {
        let diff = "\
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,3 @@
+fn hello() {
+    println!(\"new\");
+}
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert!(patch.files[0].is_new_file);
        assert_eq!(patch.files[0].old_path, "/dev/null");
        assert_eq!(patch.files[0].new_path, "new.rs");
        assert_eq!(patch.files[0].path(), "new.rs");
    }

    #[test]
    fn deleted_file() {
        let diff = "\
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1,3 +0,0 @@
-fn goodbye() {
-    println!(\"old\");
-}
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert!(patch.files[0].is_deleted_file);
        assert_eq!(patch.files[0].new_path, "/dev/null");
        assert_eq!(patch.files[0].path(), "old.rs");
    }

    #[test]
    fn rename_only_file_is_dropped() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 100%
rename from old_name.rs
rename to new_name.rs
";
        let patch = Patch::parse(diff).unwrap();
        assert!(patch.files.is_empty());
    }

    #[test]
    fn hunk_only_additions() {
        let diff = "\
diff --git a/add.rs b/add.rs
--- a/add.rs
+++ b/add.rs
@@ -5,0 +6,3 @@
+line1
+line2
+line3
";
        let patch = Patch::parse(diff).unwrap();
        let hunk = &patch.files[0].hunks[0];
        assert_eq!(hunk.old_count, 0);
        assert_eq!(hunk.new_count, 3);
        assert!(hunk.lines.iter().all(|l| l.origin == LineOrigin::Added));
    }

    #[test]
    fn binary_files_skipped() {
        let diff = "\
diff --git a/image.png b/image.png
Binary files a/image.png and b/image.png differ
diff --git a/code.rs b/code.rs
--- a/code.rs
+++ b/code.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert_eq!(patch.files[0].new_path, "code.rs");
    }

    #[test]
    fn no_newline_at_eof_sets_flag() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let patch = Patch::parse(diff).unwrap();
        let lines = &patch.files[0].hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].has_newline);
        assert!(!lines[1].has_newline);
    }

    #[test]
    fn quoted_paths_are_parsed() {
        let diff = r#"--- "a/src/my file.rs"
+++ "b/src/my file.rs"
@@ -1 +1,2 @@
 old
+new
"#;
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        assert_eq!(patch.files[0].old_path, "src/my file.rs");
        assert_eq!(patch.files[0].new_path, "src/my file.rs");
    }

    #[test]
    fn removed_line_starting_with_dashes_is_content() {
        // The removed line "---" must not be mistaken for a file boundary
        // while the hunk still expects old-side lines.
        let diff = "\
diff --git a/doc.rs b/doc.rs
--- a/doc.rs
+++ b/doc.rs
@@ -1,2 +1,1 @@
 //! Header
---- separator comment
";
        let patch = Patch::parse(diff).unwrap();
        assert_eq!(patch.files.len(), 1);
        let lines = &patch.files[0].hunks[0].lines;
        assert_eq!(lines[1].origin, LineOrigin::Removed);
        assert_eq!(lines[1].text, "--- separator comment");
    }

    #[test]
    fn blank_context_line_without_marker() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1,3 +1,4 @@
 fn f() {}

+fn g() {}
 fn h() {}
";
        let patch = Patch::parse(diff).unwrap();
        let lines = &patch.files[0].hunks[0].lines;
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].origin, LineOrigin::Context);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn crlf_content_is_preserved_in_text() {
        let diff = "diff --git a/f.rs b/f.rs\n--- a/f.rs\n+++ b/f.rs\n@@ -1 +1,2 @@\n old\r\n+new\r\n";
        let patch = Patch::parse(diff).unwrap();
        let lines = &patch.files[0].hunks[0].lines;
        assert_eq!(lines[0].text, "old\r");
        assert_eq!(lines[1].text, "new\r");
        let out = patch.to_unified();
        assert!(out.contains("+new\r\n"));
    }

    #[test]
    fn strict_mode_rejects_count_mismatch() {
        // Header declares three added lines, only two follow.
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1,1 +1,4 @@
 context
+one
+two
";
        let err = Patch::parse(diff).unwrap_err();
        assert!(matches!(err, FaultlineError::MalformedDiff(_)));
        assert!(err.to_string().contains("f.rs hunk 0"));
    }

    #[test]
    fn lenient_mode_recovers_count_mismatch() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1,1 +1,4 @@
 context
+one
+two
";
        let patch = Patch::parse_lenient(diff).unwrap();
        assert_eq!(patch.warnings.len(), 1);
        assert_eq!(patch.warnings[0].file, "f.rs");
        assert_eq!(patch.warnings[0].hunk_index, 0);
        // Counts reconciled with observed lines.
        let hunk = &patch.files[0].hunks[0];
        assert_eq!(hunk.old_count, 1);
        assert_eq!(hunk.new_count, 3);
    }

    #[test]
    fn lenient_result_round_trips_cleanly() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1,1 +1,4 @@
 context
+one
+two
";
        let patch = Patch::parse_lenient(diff).unwrap();
        let reparsed = Patch::parse(&patch.to_unified()).unwrap();
        assert_eq!(patch.files, reparsed.files);
        assert!(reparsed.warnings.is_empty());
    }

    #[test]
    fn invalid_hunk_header_is_rejected_even_lenient() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ bogus @@
+line
";
        assert!(Patch::parse(diff).is_err());
        assert!(Patch::parse_lenient(diff).is_err());
    }

    #[test]
    fn round_trip_structural_equality() {
        let diff = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,5 +10,6 @@
 fn before() {}
-fn removed() {}
+fn added_one() {}
+fn added_two() {}
 fn middle() {}
 fn after() {}
 fn last() {}
@@ -30,2 +32,3 @@
 fn tail() {}
+fn appended() {}
 fn end() {}
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,1 @@
+fn fresh() {}
";
        let patch = Patch::parse(diff).unwrap();
        let reparsed = Patch::parse(&patch.to_unified()).unwrap();
        assert_eq!(patch.files, reparsed.files);
        let again = Patch::parse(&reparsed.to_unified()).unwrap();
        assert_eq!(reparsed.files, again.files);
    }
}
