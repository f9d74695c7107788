//! `fitforms validate` - check schema documents
//!
//! Two passes per document: the embedded JSON Schema for its kind (hard
//! errors with source spans), then the structural lints. Directories are
//! expanded recursively; with no paths the whole registry is checked,
//! builtins included.

use console::style;
use miette::Result;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::schema::validator::LintIssue;
use crate::schema::{DocumentValidator, LintReport, SchemaKind, SchemaRegistry};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to validate (default: every known schema)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual problems
    #[arg(long)]
    pub summary: bool,
}

#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let registry = SchemaRegistry::with_search_dir(config.schema_dir.clone());
    let validator = DocumentValidator::new();

    // (display name, source, kind) triples to check.
    let mut documents: Vec<(String, String, SchemaKind)> = Vec::new();

    if args.paths.is_empty() {
        for entry in registry.entries() {
            if let Ok(loaded) = registry.resolve(&entry.name) {
                documents.push((loaded.filename, loaded.source, entry.kind));
            }
        }
    } else {
        for path in expand_paths(&args.paths) {
            let filename = path.display().to_string();
            let Some(kind) =
                SchemaKind::from_filename(&path.file_name().unwrap_or_default().to_string_lossy())
            else {
                if !args.summary && !global.quiet {
                    println!(
                        "{} {} - not a *.form.yaml or *.wizard.yaml document (skipped)",
                        style("?").yellow(),
                        filename
                    );
                }
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(source) => documents.push((filename, source, kind)),
                Err(e) => {
                    return Err(miette::miette!("failed to read {}: {}", filename, e));
                }
            }
        }
    }

    if !global.quiet {
        println!(
            "{} Validating {} document(s)...\n",
            style("→").blue(),
            documents.len()
        );
    }

    let mut stats = ValidationStats::default();

    for (filename, source, kind) in &documents {
        stats.files_checked += 1;

        match validator.check(source, filename, *kind) {
            Ok(lint) => {
                stats.total_errors += lint.errors.len();
                stats.total_warnings += lint.warnings.len();
                if lint.passes(args.strict) {
                    stats.files_passed += 1;
                } else {
                    stats.files_failed += 1;
                }
                report_lint(filename, &lint, &args, global);
            }
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();

                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        filename,
                        e.violation_count()
                    );
                    let report = miette::Report::new(e);
                    println!("{:?}", report);
                }
            }
        }
    }

    print_summary(&stats, global);

    if stats.files_failed > 0 {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 document has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} documents have errors",
                stats.files_failed
            ))
        }
    } else {
        if !global.quiet {
            println!(
                "{} All documents passed validation!",
                style("✓").green().bold()
            );
        }
        Ok(())
    }
}

/// Expand directories into their *.form.yaml / *.wizard.yaml files.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .flatten()
                .filter(|e| e.file_type().is_file())
            {
                let name = entry.file_name().to_string_lossy();
                if SchemaKind::from_filename(&name).is_some() {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn report_lint(filename: &str, lint: &LintReport, args: &ValidateArgs, global: &GlobalOpts) {
    if args.summary || global.quiet {
        return;
    }

    if lint.is_clean() {
        println!("{} {}", style("✓").green(), filename);
        return;
    }

    let glyph = if lint.passes(args.strict) {
        style("!").yellow()
    } else {
        style("✗").red()
    };
    println!(
        "{} {} - {} error(s), {} warning(s)",
        glyph,
        filename,
        lint.errors.len(),
        lint.warnings.len()
    );
    for issue in &lint.errors {
        print_issue(issue, true);
    }
    for issue in &lint.warnings {
        print_issue(issue, false);
    }
}

fn print_issue(issue: &LintIssue, error: bool) {
    let message = format!("{}: {}", issue.path, issue.message);
    if error {
        println!("    {}", style(message).red());
    } else {
        println!("    {}", style(message).yellow());
    }
    if let Some(suggestion) = &issue.suggestion {
        println!("      {}", style(suggestion).dim());
    }
}

fn print_summary(stats: &ValidationStats, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Documents checked:  {}", style(stats.files_checked).cyan());
    println!("  Documents passed:   {}", style(stats.files_passed).green());
    println!("  Documents failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:       {}", style(stats.total_errors).red());

    if stats.total_warnings > 0 {
        println!(
            "  Total warnings:     {}",
            style(stats.total_warnings).yellow()
        );
    }

    println!();
}
