use faultline_core::{FaultlineError, MutationKind, MutationStyle, Result};
use regex::Regex;

/// Compiled line predicates and replacement templates for one version of
/// the mutation table.
///
/// Templates are versioned so a study can pin the exact replacement text
/// its mutants were generated with; an unknown version is a configuration
/// error, never a silent fallback.
///
/// # Examples
///
/// ```
/// use faultline_mutate::TemplateSet;
///
/// let templates = TemplateSet::for_version(1).unwrap();
/// assert_eq!(templates.version(), 1);
/// assert!(TemplateSet::for_version(99).is_err());
/// ```
#[derive(Debug)]
pub struct TemplateSet {
    version: u32,
    question_suffix: Regex,
    question_semi: Regex,
    call_line: Regex,
    call_tail: Regex,
    let_assign: Regex,
}

const DECLARATION_PREFIXES: &[&str] = &["use ", "fn ", "pub ", "struct ", "enum ", "impl "];

impl TemplateSet {
    /// Compile the template table for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultlineError::Config`] for an unknown version.
    pub fn for_version(version: u32) -> Result<Self> {
        if version != 1 {
            return Err(FaultlineError::Config(format!(
                "unknown mutation template version: {version}"
            )));
        }
        Ok(Self {
            version,
            question_suffix: compile(r"\?([;,)\]}])")?,
            question_semi: compile(r"\?[ \t]*;")?,
            call_line: compile(r"\w[\w.:]*[ \t]*\(.*\)[ \t]*;[ \t]*$")?,
            call_tail: compile(r"\)[ \t]*;[ \t]*$")?,
            let_assign: compile(r"^([ \t]*let[ \t]+[^=]+?=[ \t]*)(.+?);([ \t]*(//.*)?)$")?,
        })
    }

    /// The table version this set was compiled from.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Attempt the kind-specific rewrite of one added line.
    ///
    /// Returns `None` when the line does not satisfy the kind's predicate;
    /// `Some` carries the replacement lines (more than one for templates
    /// that split a statement into a block).
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_core::{MutationKind, MutationStyle};
    /// use faultline_mutate::TemplateSet;
    ///
    /// let templates = TemplateSet::for_version(1).unwrap();
    /// let out = templates
    ///     .rewrite(MutationKind::Unwrap, MutationStyle::Heuristic, "    let x = load()?;")
    ///     .unwrap();
    /// assert_eq!(out, vec!["    let x = load().unwrap();"]);
    /// ```
    pub fn rewrite(
        &self,
        kind: MutationKind,
        style: MutationStyle,
        text: &str,
    ) -> Option<Vec<String>> {
        match (kind, style) {
            (MutationKind::Unwrap, MutationStyle::Heuristic) => {
                self.rewrite_unwrap(text, ".unwrap()")
            }
            (MutationKind::Unwrap, MutationStyle::Adversarial) => {
                self.rewrite_unwrap(text, ".expect(\"invariant violated\")")
            }
            (MutationKind::Unsafe, MutationStyle::Heuristic) => self.rewrite_unsafe_wrap(text),
            (MutationKind::Unsafe, MutationStyle::Adversarial) => self.rewrite_unsafe_pointer(text),
            (MutationKind::Panic, MutationStyle::Heuristic) => rewrite_panic_control_flow(text),
            (MutationKind::Panic, MutationStyle::Adversarial) => rewrite_panic_statement(text),
            (MutationKind::Gold, _) => None,
        }
    }

    /// The generic fallback injection for a kind, matching `indent`.
    ///
    /// Returns `None` only for the pass-through gold kind, which has no
    /// fallback.
    pub fn fallback_line(&self, kind: MutationKind, indent: &str) -> Option<String> {
        match kind {
            MutationKind::Unwrap => Some(format!("{indent}let _ = Some(()).unwrap();")),
            MutationKind::Unsafe => Some(format!(
                "{indent}let _ = unsafe {{ std::ptr::read_volatile(&0u8) }};"
            )),
            MutationKind::Panic => Some(format!("{indent}if false {{ panic!(\"mutation\"); }}")),
            MutationKind::Gold => None,
        }
    }

    /// Rewrite error propagation (`expr?`) or a call statement to a direct
    /// `.unwrap()` / `.expect(…)` at the same position.
    fn rewrite_unwrap(&self, text: &str, call: &str) -> Option<Vec<String>> {
        if text.contains('?') {
            if self.question_suffix.is_match(text) {
                let rep = format!("{call}${{1}}");
                let replaced = self.question_suffix.replace(text, rep.as_str()).into_owned();
                return Some(vec![replaced]);
            }
            if self.question_semi.is_match(text) {
                let rep = format!("{call};");
                let replaced = self.question_semi.replace(text, rep.as_str()).into_owned();
                return Some(vec![replaced]);
            }
        }

        if text.contains(".unwrap(") || text.contains(".expect(") {
            return None;
        }
        if self.call_line.is_match(text) {
            let rep = format!("){call};");
            let replaced = self.call_tail.replace(text, rep.as_str()).into_owned();
            return Some(vec![replaced]);
        }

        None
    }

    /// Wrap a `let` initializer or a standalone call statement in
    /// `unsafe { … }` on a single line.
    fn rewrite_unsafe_wrap(&self, text: &str) -> Option<Vec<String>> {
        if text.contains("unsafe") {
            return None;
        }
        if let Some(caps) = self.let_assign.captures(text) {
            let prefix = &caps[1];
            let expr = &caps[2];
            let suffix = caps.get(3).map_or("", |m| m.as_str());
            return Some(vec![format!("{prefix}unsafe {{ {expr} }};{suffix}")]);
        }
        if is_declaration(text.trim_start()) {
            return None;
        }
        if self.call_line.is_match(text) {
            let indent = leading_ws(text);
            let stmt = text.trim().trim_end_matches(';');
            return Some(vec![format!("{indent}unsafe {{ {stmt}; }}")]);
        }
        None
    }

    /// Replace a `let` initializer or a call statement with a block doing
    /// literal raw-pointer cast and read activity.
    fn rewrite_unsafe_pointer(&self, text: &str) -> Option<Vec<String>> {
        if text.contains("unsafe") {
            return None;
        }
        let indent = leading_ws(text);
        if let Some(caps) = self.let_assign.captures(text) {
            let prefix = &caps[1];
            let expr = &caps[2];
            let suffix = caps.get(3).map_or("", |m| m.as_str());
            return Some(vec![
                format!("{prefix}unsafe {{"),
                format!("{indent}    let raw = &({expr}) as *const _;"),
                format!("{indent}    std::ptr::read(raw)"),
                format!("{indent}}};{suffix}"),
            ]);
        }
        if is_declaration(text.trim_start()) {
            return None;
        }
        if self.call_line.is_match(text) {
            let stmt = text.trim().trim_end_matches(';');
            return Some(vec![
                format!("{indent}unsafe {{"),
                format!("{indent}    let raw = &({stmt}) as *const _;"),
                format!("{indent}    std::ptr::read_volatile(raw);"),
                format!("{indent}}}"),
            ]);
        }
        None
    }
}

/// Replace bare `break;` / `continue;` statements with a panic.
fn rewrite_panic_control_flow(text: &str) -> Option<Vec<String>> {
    if text.contains("panic!") {
        return None;
    }
    let stripped = text.trim();
    if stripped == "break;" || stripped == "continue;" {
        let indent = leading_ws(text);
        return Some(vec![format!("{indent}panic!(\"mutation\");")]);
    }
    None
}

/// Replace any statement-shaped line wholesale with a panic.
fn rewrite_panic_statement(text: &str) -> Option<Vec<String>> {
    if text.contains("panic!") {
        return None;
    }
    let stripped = text.trim();
    if stripped.is_empty() || stripped.starts_with("//") {
        return None;
    }
    if is_declaration(stripped) {
        return None;
    }
    let starts_like_statement = stripped
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    if starts_like_statement && stripped.ends_with(';') {
        let indent = leading_ws(text);
        return Some(vec![format!("{indent}panic!(\"mutation\");")]);
    }
    None
}

fn is_declaration(stripped: &str) -> bool {
    DECLARATION_PREFIXES
        .iter()
        .any(|prefix| stripped.starts_with(prefix))
}

pub(crate) fn leading_ws(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| FaultlineError::Config(format!("invalid mutation pattern `{pattern}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> TemplateSet {
        TemplateSet::for_version(1).unwrap()
    }

    fn one(
        t: &TemplateSet,
        kind: MutationKind,
        style: MutationStyle,
        text: &str,
    ) -> Option<String> {
        t.rewrite(kind, style, text).map(|mut lines| {
            assert_eq!(lines.len(), 1);
            lines.remove(0)
        })
    }

    #[test]
    fn unknown_version_is_config_error() {
        let err = TemplateSet::for_version(7).unwrap_err();
        assert!(matches!(err, FaultlineError::Config(_)));
    }

    #[test]
    fn unwrap_rewrites_question_before_separator() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Heuristic, "    let x = risky_call()?;"),
            Some("    let x = risky_call().unwrap();".into())
        );
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Heuristic, "    f(g()?, h)"),
            Some("    f(g().unwrap(), h)".into())
        );
    }

    #[test]
    fn unwrap_rewrites_question_with_space_before_semi() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Heuristic, "    let x = load()? ;"),
            Some("    let x = load().unwrap();".into())
        );
    }

    #[test]
    fn unwrap_rewrites_call_statement() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Heuristic, "    validate(input);"),
            Some("    validate(input).unwrap();".into())
        );
    }

    #[test]
    fn unwrap_skips_already_unwrapped_call() {
        let t = templates();
        assert!(t
            .rewrite(
                MutationKind::Unwrap,
                MutationStyle::Heuristic,
                "    config.get(key).unwrap();"
            )
            .is_none());
        assert!(t
            .rewrite(
                MutationKind::Unwrap,
                MutationStyle::Heuristic,
                "    config.get(key).expect(\"set\");"
            )
            .is_none());
    }

    #[test]
    fn unwrap_skips_plain_lines() {
        let t = templates();
        assert!(t
            .rewrite(MutationKind::Unwrap, MutationStyle::Heuristic, "    let x = 5;")
            .is_none());
        assert!(t
            .rewrite(MutationKind::Unwrap, MutationStyle::Heuristic, "}")
            .is_none());
    }

    #[test]
    fn unwrap_adversarial_uses_expect() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Adversarial, "    let x = load()?;"),
            Some("    let x = load().expect(\"invariant violated\");".into())
        );
        assert_eq!(
            one(&t, MutationKind::Unwrap, MutationStyle::Adversarial, "    commit(tx);"),
            Some("    commit(tx).expect(\"invariant violated\");".into())
        );
    }

    #[test]
    fn unsafe_wraps_let_initializer() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unsafe, MutationStyle::Heuristic, "    let y = 5;"),
            Some("    let y = unsafe { 5 };".into())
        );
        assert_eq!(
            one(&t, MutationKind::Unsafe, MutationStyle::Heuristic, "    let v = fetch(k); // hot"),
            Some("    let v = unsafe { fetch(k) }; // hot".into())
        );
    }

    #[test]
    fn unsafe_wraps_call_statement() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Unsafe, MutationStyle::Heuristic, "    flush(buf);"),
            Some("    unsafe { flush(buf); }".into())
        );
    }

    #[test]
    fn unsafe_skips_existing_unsafe_and_declarations() {
        let t = templates();
        assert!(t
            .rewrite(
                MutationKind::Unsafe,
                MutationStyle::Heuristic,
                "    let p = unsafe { raw() };"
            )
            .is_none());
        assert!(t
            .rewrite(MutationKind::Unsafe, MutationStyle::Heuristic, "use std::fs;")
            .is_none());
        assert!(t
            .rewrite(MutationKind::Unsafe, MutationStyle::Heuristic, "pub fn id() {}")
            .is_none());
    }

    #[test]
    fn unsafe_adversarial_emits_pointer_block() {
        let t = templates();
        let lines = t
            .rewrite(MutationKind::Unsafe, MutationStyle::Adversarial, "    let y = 5;")
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "    let y = unsafe {".to_string(),
                "        let raw = &(5) as *const _;".to_string(),
                "        std::ptr::read(raw)".to_string(),
                "    };".to_string(),
            ]
        );
    }

    #[test]
    fn panic_replaces_control_flow() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Panic, MutationStyle::Heuristic, "        break;"),
            Some("        panic!(\"mutation\");".into())
        );
        assert_eq!(
            one(&t, MutationKind::Panic, MutationStyle::Heuristic, "        continue;"),
            Some("        panic!(\"mutation\");".into())
        );
        assert!(t
            .rewrite(MutationKind::Panic, MutationStyle::Heuristic, "    let x = 1;")
            .is_none());
    }

    #[test]
    fn panic_skips_existing_panic() {
        let t = templates();
        assert!(t
            .rewrite(
                MutationKind::Panic,
                MutationStyle::Heuristic,
                "    panic!(\"already\"); break;"
            )
            .is_none());
    }

    #[test]
    fn panic_adversarial_replaces_statements_wholesale() {
        let t = templates();
        assert_eq!(
            one(&t, MutationKind::Panic, MutationStyle::Adversarial, "    let total = a + b;"),
            Some("    panic!(\"mutation\");".into())
        );
        assert!(t
            .rewrite(MutationKind::Panic, MutationStyle::Adversarial, "    }")
            .is_none());
        assert!(t
            .rewrite(MutationKind::Panic, MutationStyle::Adversarial, "    // note")
            .is_none());
        assert!(t
            .rewrite(MutationKind::Panic, MutationStyle::Adversarial, "use std::fs;")
            .is_none());
    }

    #[test]
    fn gold_never_rewrites() {
        let t = templates();
        assert!(t
            .rewrite(MutationKind::Gold, MutationStyle::Heuristic, "    let x = f()?;")
            .is_none());
        assert!(t.fallback_line(MutationKind::Gold, "    ").is_none());
    }

    #[test]
    fn fallback_lines_carry_their_pattern() {
        let t = templates();
        assert_eq!(
            t.fallback_line(MutationKind::Unwrap, "    ").unwrap(),
            "    let _ = Some(()).unwrap();"
        );
        assert!(t
            .fallback_line(MutationKind::Unsafe, "")
            .unwrap()
            .contains("unsafe {"));
        assert!(t
            .fallback_line(MutationKind::Panic, "  ")
            .unwrap()
            .contains("panic!"));
    }
}
