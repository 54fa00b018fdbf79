use std::path::Path;

use faultline_core::{PatternKind, PolicyConfig};

/// Compiled policy-eligibility and pattern rules.
///
/// Built once per invocation from [`PolicyConfig`]; user glob patterns are
/// compiled up front so per-line checks stay cheap.
///
/// # Examples
///
/// ```
/// use faultline_policy::LineClassifier;
///
/// let classifier = LineClassifier::default_classifier();
/// assert!(classifier.is_policy_eligible("src/lib.rs"));
/// assert!(!classifier.is_policy_eligible("tests/integration.rs"));
/// assert!(!classifier.is_policy_eligible("README.md"));
/// ```
pub struct LineClassifier {
    source_extensions: Vec<String>,
    test_path_segments: Vec<String>,
    test_file_prefixes: Vec<String>,
    test_stem_suffixes: Vec<String>,
    skip_patterns: Vec<glob::Pattern>,
    safety_markers: Vec<String>,
    safety_lookback: usize,
}

impl LineClassifier {
    /// Create a classifier with the default policy configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_policy::LineClassifier;
    ///
    /// let classifier = LineClassifier::default_classifier();
    /// assert!(!classifier.is_policy_eligible("benches/parse.rs"));
    /// ```
    pub fn default_classifier() -> Self {
        Self::from_config(&PolicyConfig::default())
    }

    /// Create a classifier from policy configuration.
    ///
    /// Invalid glob patterns are skipped rather than rejected, matching the
    /// tolerant handling of user-supplied patterns elsewhere in the
    /// pipeline.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_core::PolicyConfig;
    /// use faultline_policy::LineClassifier;
    ///
    /// let mut config = PolicyConfig::default();
    /// config.skip_patterns.push("generated/**".into());
    /// let classifier = LineClassifier::from_config(&config);
    /// assert!(!classifier.is_policy_eligible("generated/api.rs"));
    /// ```
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut skip_patterns = Vec::new();
        for pat in &config.skip_patterns {
            if let Ok(p) = glob::Pattern::new(pat) {
                skip_patterns.push(p);
            }
        }

        Self {
            source_extensions: config.source_extensions.clone(),
            test_path_segments: config.test_path_segments.clone(),
            test_file_prefixes: config.test_file_prefixes.clone(),
            test_stem_suffixes: config.test_stem_suffixes.clone(),
            skip_patterns,
            safety_markers: config.safety_markers.clone(),
            safety_lookback: config.safety_lookback,
        }
    }

    /// Whether a file path is production source subject to policy.
    ///
    /// True only for recognized source extensions, and false for anything
    /// under a test/bench path segment, test-named files, and paths matching
    /// a user skip glob. Policy is about production code quality, so test
    /// scaffolding is out of scope entirely.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_policy::LineClassifier;
    ///
    /// let classifier = LineClassifier::default_classifier();
    /// assert!(classifier.is_policy_eligible("crates/app/src/engine.rs"));
    /// assert!(!classifier.is_policy_eligible("crates/app/tests/engine.rs"));
    /// assert!(!classifier.is_policy_eligible("src/parser_test.rs"));
    /// assert!(!classifier.is_policy_eligible("src/test_parser.rs"));
    /// ```
    pub fn is_policy_eligible(&self, path: &str) -> bool {
        let p = Path::new(path);

        let Some(ext) = p.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.source_extensions.iter().any(|e| e == ext) {
            return false;
        }

        for part in path.split('/') {
            if self.test_path_segments.iter().any(|seg| seg == part) {
                return false;
            }
        }

        let file_name = p.file_name().and_then(|f| f.to_str()).unwrap_or_default();
        if self
            .test_file_prefixes
            .iter()
            .any(|prefix| file_name.starts_with(prefix.as_str()))
        {
            return false;
        }

        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if self
            .test_stem_suffixes
            .iter()
            .any(|suffix| stem.ends_with(suffix.as_str()))
        {
            return false;
        }

        if self.skip_patterns.iter().any(|pat| pat.matches(path)) {
            return false;
        }

        true
    }

    /// Which policy patterns a line of source text contains.
    ///
    /// Ordered textual rules; a line may match several kinds at once.
    /// The `unsafe` rule is a best-effort token check that ignores string
    /// literal contents and `//` comments, not a full tokenization.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_core::PatternKind;
    /// use faultline_policy::LineClassifier;
    ///
    /// let classifier = LineClassifier::default_classifier();
    /// let kinds = classifier.match_patterns("let v = map.get(&k).unwrap();");
    /// assert_eq!(kinds, vec![PatternKind::UnwrapExpect]);
    ///
    /// let kinds = classifier.match_patterns("// unsafe is only mentioned here");
    /// assert!(kinds.is_empty());
    /// ```
    pub fn match_patterns(&self, line: &str) -> Vec<PatternKind> {
        let mut kinds = Vec::new();

        if line.contains(".unwrap(") || line.contains(".expect(") {
            kinds.push(PatternKind::UnwrapExpect);
        }

        if contains_unsafe_token(&code_portion(line)) {
            kinds.push(PatternKind::Unsafe);
        }

        if line.contains("panic!") {
            kinds.push(PatternKind::Panic);
        }

        kinds
    }

    /// Whether a window of lines preceding an `unsafe` site justifies it.
    ///
    /// Scans the last [`safety_lookback`](PolicyConfig::safety_lookback)
    /// entries of `preceding` for any configured safety marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_policy::LineClassifier;
    ///
    /// let classifier = LineClassifier::default_classifier();
    /// assert!(classifier.has_safety_comment(&["// SAFETY: ptr is valid for reads"]));
    /// assert!(!classifier.has_safety_comment(&["let p = ptr;"]));
    /// ```
    pub fn has_safety_comment(&self, preceding: &[&str]) -> bool {
        let start = preceding.len().saturating_sub(self.safety_lookback);
        preceding[start..]
            .iter()
            .any(|line| self.safety_markers.iter().any(|m| line.contains(m.as_str())))
    }

    /// Size of the safety-comment lookback window.
    pub fn safety_lookback(&self) -> usize {
        self.safety_lookback
    }
}

/// Strip string-literal contents and a trailing `//` comment from a line.
///
/// Escapes inside strings are honored; char literals are not tracked. Good
/// enough to keep `"unsafe"` in a string or comment from counting as code.
fn code_portion(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            if c == '\\' {
                chars.next();
            } else if c == '"' {
                in_string = false;
            }
            out.push(' ');
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'/') => break,
            _ => out.push(c),
        }
    }

    out
}

fn contains_unsafe_token(code: &str) -> bool {
    let bytes = code.as_bytes();
    let mut search_from = 0;
    while let Some(pos) = code[search_from..].find("unsafe") {
        let start = search_from + pos;
        let end = start + "unsafe".len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        search_from = end;
    }
    false
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
