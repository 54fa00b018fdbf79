use std::io::Read;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};

use faultline_core::{FaultlineConfig, MutationKind, MutationStyle, OutputFormat};
use faultline_diff::Patch;
use faultline_mutate::TemplateSet;
use faultline_policy::LineClassifier;

#[derive(Parser)]
#[command(
    name = "faultline",
    version,
    about = "Patch mutation and policy analysis",
    long_about = "Faultline mutates benchmark fix patches to inject policy-violating constructs\n\
                   and counts those constructs in candidate patches — restricted to newly added\n\
                   lines in non-test source files.\n\n\
                   Examples:\n  \
                     git show -p | faultline mutate --kind unwrap    Mutate a diff from stdin\n  \
                     faultline mutate --file fix.patch --kind unsafe --style adversarial\n  \
                     faultline count --file candidate.patch          Count policy patterns\n  \
                     faultline init                                  Create a .faultline.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .faultline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "json",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         json  One machine-readable JSON object (default)\n  \
                         text  Human-readable summary"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Mutate a patch to inject a policy-violating construct
    #[command(long_about = "Mutate a patch to inject a policy-violating construct.\n\n\
        Rewrites the first added line in a policy-eligible file that satisfies the\n\
        kind's predicate; when nothing matches, a generic fallback line carrying the\n\
        pattern is inserted so the mutation count is never zero. The kind `gs` passes\n\
        the gold patch through unchanged. Reads from stdin or a file.\n\n\
        Examples:\n  git diff | faultline mutate --kind panic\n  \
        faultline mutate --file fix.patch --kind unsafe --style adversarial")]
    Mutate {
        /// Mutation kind: unwrap, unsafe, panic, or gs (gold pass-through)
        #[arg(long)]
        kind: MutationKind,

        /// Strength profile: heuristic (minimal edit) or adversarial
        #[arg(long, default_value = "heuristic")]
        style: MutationStyle,

        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Tolerate hunk-count mismatches (warnings instead of errors)
        #[arg(long)]
        lenient: bool,
    },
    /// Count policy patterns in a patch's added lines
    #[command(long_about = "Count policy patterns in a patch's added lines.\n\n\
        Reports unwrap/expect calls, unsafe blocks, panic invocations, and unsafe\n\
        blocks lacking a safety comment, restricted to added lines in non-test\n\
        source files. Reads from stdin or a file.\n\n\
        Examples:\n  git diff | faultline count\n  faultline count --file candidate.patch")]
    Count {
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Tolerate hunk-count mismatches (warnings instead of errors)
        #[arg(long)]
        lenient: bool,
    },
    /// Create a default .faultline.toml configuration file
    #[command(long_about = "Create a default .faultline.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .faultline.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# Faultline Configuration

[policy]
# Source-file extensions subject to policy
# source_extensions = ["rs"]
# Path segments marking test/bench trees
# test_path_segments = ["tests", "benches", "test", "testing"]
# File-name prefixes and stem suffixes marking test files
# test_file_prefixes = ["test_"]
# test_stem_suffixes = ["_test", "_tests"]
# Extra glob patterns excluded from policy
# skip_patterns = ["generated/**"]
# Comment markers that justify an unsafe block
# safety_markers = ["SAFETY:"]
# How many preceding lines to scan for a safety marker
# safety_lookback = 3

[mutation]
# Which adversarial template table to use
# template_version = 1
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FaultlineConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new(".faultline.toml");
            if default_path.exists() {
                FaultlineConfig::from_file(default_path).into_diagnostic()?
            } else {
                FaultlineConfig::default()
            }
        }
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!(
            "policy: extensions {:?}, test segments {:?}, template version {}",
            config.policy.source_extensions,
            config.policy.test_path_segments,
            config.mutation.template_version,
        );
    }

    match cli.command {
        Command::Mutate {
            kind,
            style,
            ref file,
            lenient,
        } => {
            let input = read_diff_input(file)?;
            let patch = parse_input(&input, lenient)?;
            report_warnings(&patch);

            let classifier = LineClassifier::from_config(&config.policy);
            let templates = TemplateSet::for_version(config.mutation.template_version).into_diagnostic()?;
            let outcome = faultline_mutate::mutate(&patch, kind, style, &classifier, &templates).into_diagnostic()?;
            let record = outcome.to_record();

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} mutation ({}) applied {} edit(s)",
                        record.kind, record.style, record.mutation_count
                    );
                    print!("{}", record.mutated_diff);
                }
            }
        }
        Command::Count { ref file, lenient } => {
            let input = read_diff_input(file)?;
            let patch = parse_input(&input, lenient)?;
            report_warnings(&patch);

            let classifier = LineClassifier::from_config(&config.policy);
            let counts = faultline_policy::count(&patch, &classifier);

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&counts).into_diagnostic()?);
                }
                OutputFormat::Text => {
                    println!("unwrap/expect calls:            {}", counts.unwrap);
                    println!("unsafe blocks:                  {}", counts.unsafe_blocks);
                    println!("panic invocations:              {}", counts.panic);
                    println!(
                        "unsafe without safety comment:  {}",
                        counts.unsafe_without_safety_comment
                    );
                }
            }
        }
        Command::Init => {
            let path = std::path::Path::new(".faultline.toml");
            if path.exists() {
                miette::bail!(".faultline.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .faultline.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "faultline", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn read_diff_input(file: &Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn parse_input(input: &str, lenient: bool) -> Result<Patch> {
    let patch = if lenient {
        Patch::parse_lenient(input).into_diagnostic()?
    } else {
        Patch::parse(input).into_diagnostic()?
    };
    Ok(patch)
}

fn report_warnings(patch: &Patch) {
    for warning in &patch.warnings {
        eprintln!("warning: malformed hunk accepted: {warning}");
    }
}
