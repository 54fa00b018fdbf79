use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The policy-violating construct a mutation injects.
///
/// `Gold` is the pass-through case: the patch is emitted unmodified so the
/// same pipeline can evaluate the reference fix alongside its mutants.
///
/// # Examples
///
/// ```
/// use faultline_core::MutationKind;
///
/// let kind: MutationKind = "unwrap".parse().unwrap();
/// assert_eq!(kind, MutationKind::Unwrap);
///
/// let gold: MutationKind = "gs".parse().unwrap();
/// assert_eq!(gold, MutationKind::Gold);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Inject `.unwrap()` / `.expect(` calls.
    #[serde(rename = "unwrap")]
    Unwrap,
    /// Inject `unsafe` blocks without safety comments.
    #[serde(rename = "unsafe")]
    Unsafe,
    /// Inject `panic!` invocations.
    #[serde(rename = "panic")]
    Panic,
    /// No mutation: pass the gold patch through unchanged.
    #[serde(rename = "gs")]
    Gold,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Unwrap => write!(f, "unwrap"),
            MutationKind::Unsafe => write!(f, "unsafe"),
            MutationKind::Panic => write!(f, "panic"),
            MutationKind::Gold => write!(f, "gs"),
        }
    }
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unwrap" => Ok(MutationKind::Unwrap),
            "unsafe" => Ok(MutationKind::Unsafe),
            // Older pipeline configs spell this with the macro bang.
            "panic" | "panic!" => Ok(MutationKind::Panic),
            "gs" | "gold" => Ok(MutationKind::Gold),
            other => Err(format!("unknown mutation kind: {other}")),
        }
    }
}

/// Strength profile for a mutation.
///
/// # Examples
///
/// ```
/// use faultline_core::MutationStyle;
///
/// let style: MutationStyle = "adversarial".parse().unwrap();
/// assert_eq!(style, MutationStyle::Adversarial);
/// assert_eq!(MutationStyle::default(), MutationStyle::Heuristic);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStyle {
    /// Minimal single-line textual edit satisfying the kind's predicate.
    #[default]
    Heuristic,
    /// Stronger replacement template for the same selection logic.
    Adversarial,
}

impl fmt::Display for MutationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationStyle::Heuristic => write!(f, "heuristic"),
            MutationStyle::Adversarial => write!(f, "adversarial"),
        }
    }
}

impl FromStr for MutationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heuristic" => Ok(MutationStyle::Heuristic),
            "adversarial" => Ok(MutationStyle::Adversarial),
            other => Err(format!("unknown mutation style: {other}")),
        }
    }
}

/// A policy-relevant textual pattern found on an added line.
///
/// A single line may match several kinds at once; counting records all of
/// them.
///
/// # Examples
///
/// ```
/// use faultline_core::PatternKind;
///
/// let kind: PatternKind = serde_json::from_str("\"unwrap_expect\"").unwrap();
/// assert_eq!(kind, PatternKind::UnwrapExpect);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// A `.unwrap(` or `.expect(` call.
    UnwrapExpect,
    /// A block-opening `unsafe` token.
    Unsafe,
    /// A `panic!` invocation.
    Panic,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::UnwrapExpect => write!(f, "unwrap_expect"),
            PatternKind::Unsafe => write!(f, "unsafe"),
            PatternKind::Panic => write!(f, "panic"),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use faultline_core::OutputFormat;
///
/// let fmt: OutputFormat = "text".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Text);
/// assert_eq!(OutputFormat::default(), OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable JSON record, one object per invocation.
    #[default]
    Json,
    /// Human-readable summary.
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_kind_from_str() {
        assert_eq!("unwrap".parse::<MutationKind>().unwrap(), MutationKind::Unwrap);
        assert_eq!("unsafe".parse::<MutationKind>().unwrap(), MutationKind::Unsafe);
        assert_eq!("panic".parse::<MutationKind>().unwrap(), MutationKind::Panic);
        assert_eq!("panic!".parse::<MutationKind>().unwrap(), MutationKind::Panic);
        assert_eq!("gs".parse::<MutationKind>().unwrap(), MutationKind::Gold);
        assert_eq!("GOLD".parse::<MutationKind>().unwrap(), MutationKind::Gold);
        assert!("drop".parse::<MutationKind>().is_err());
    }

    #[test]
    fn mutation_kind_serializes_to_pipeline_names() {
        assert_eq!(serde_json::to_string(&MutationKind::Gold).unwrap(), "\"gs\"");
        assert_eq!(
            serde_json::to_string(&MutationKind::Unwrap).unwrap(),
            "\"unwrap\""
        );
        let parsed: MutationKind = serde_json::from_str("\"panic\"").unwrap();
        assert_eq!(parsed, MutationKind::Panic);
    }

    #[test]
    fn mutation_kind_display_roundtrips_through_from_str() {
        for kind in [
            MutationKind::Unwrap,
            MutationKind::Unsafe,
            MutationKind::Panic,
            MutationKind::Gold,
        ] {
            assert_eq!(kind.to_string().parse::<MutationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn mutation_style_from_str() {
        assert_eq!(
            "heuristic".parse::<MutationStyle>().unwrap(),
            MutationStyle::Heuristic
        );
        assert_eq!(
            "Adversarial".parse::<MutationStyle>().unwrap(),
            MutationStyle::Adversarial
        );
        assert!("brutal".parse::<MutationStyle>().is_err());
    }

    #[test]
    fn pattern_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PatternKind::UnwrapExpect).unwrap(),
            "\"unwrap_expect\""
        );
        assert_eq!(
            serde_json::to_string(&PatternKind::Unsafe).unwrap(),
            "\"unsafe\""
        );
    }

    #[test]
    fn output_format_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
