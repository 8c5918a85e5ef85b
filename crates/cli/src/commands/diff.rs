use std::path::Path;

use anyhow::{Context, Result};
use ctfdiff_core::report::{DiffReport, InputInfo, ReportEntry};
use ctfdiff_core::{diff_containers, CompareOptions, Container};
use tracing::info;

use crate::sha256_file;

/// Decode both inputs and diff their function and variable signatures.
pub fn diff_files(left: &Path, right: &Path, options: &CompareOptions) -> Result<DiffReport> {
    let lhs = open_container(left)?;
    let rhs = open_container(right)?;

    let diff = diff_containers(&lhs, &rhs, options);
    let report = DiffReport::from_diff(&diff, options).with_inputs(
        InputInfo::new(left.display().to_string(), &lhs).with_sha256(Some(sha256_file(left)?)),
        InputInfo::new(right.display().to_string(), &rhs).with_sha256(Some(sha256_file(right)?)),
    );

    info!(
        left = %left.display(),
        right = %right.display(),
        functions = ?report.summary.functions,
        variables = ?report.summary.variables,
        "diff complete"
    );

    Ok(report)
}

/// Compare two object files and print the differences.
///
/// Finding differences is not an error; only unreadable or malformed
/// inputs are.
pub fn diff_command(left: &str, right: &str, options: &CompareOptions, json: bool) -> Result<()> {
    let report = diff_files(Path::new(left), Path::new(right), options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    Ok(())
}

/// Render a report as `< [slot] name` / `> [slot] name` lines, functions
/// first, then variables.
pub fn render_text(report: &DiffReport) -> String {
    let mut out = String::new();
    render_group(&mut out, "Functions", &report.left.functions, &report.right.functions);
    render_group(&mut out, "Variables", &report.left.variables, &report.right.variables);
    out
}

fn render_group(out: &mut String, title: &str, left: &[ReportEntry], right: &[ReportEntry]) {
    out.push_str(&format!("{title}:\n"));
    for entry in left {
        out.push_str(&format!("< [{}] {}\n", entry.slot, entry.name));
    }
    for entry in right {
        out.push_str(&format!("> [{}] {}\n", entry.slot, entry.name));
    }
}

fn open_container(path: &Path) -> Result<Container> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    Container::open(path).with_context(|| format!("Cannot parse file {}", path.display()))
}
