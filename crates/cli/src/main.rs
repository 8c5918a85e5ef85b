use anyhow::Result;
use clap::Parser;
use ctfdiff::commands::{diff_command, resolve_compare_options};
use ctfdiff::logging::{init_logging, LogFormat, LogLevel};
use ctfdiff_core::format::TypeKind;

/// Compare the SUNW_ctf section of two ELF files.
///
/// Lines starting with `<` are symbols only present (or typed differently)
/// in the first file; `>` lines are the same for the second file.
#[derive(Parser, Debug)]
#[command(
    name = "ctfdiff",
    version,
    about = "Compare the CTF type information of two object files",
    long_about = None
)]
struct Cli {
    /// First (left) object file.
    left: String,

    /// Second (right) object file.
    right: String,

    /// Ignore the const qualifier when comparing types.
    #[arg(long, visible_alias = "f-ignore-const", default_value_t = false)]
    ignore_const: bool,

    /// Qualifier kind to look through when comparing (repeatable).
    #[arg(long = "ignore", value_name = "KIND")]
    ignore: Vec<TypeKind>,

    /// JSON diff config (`{"ignore_qualifiers": [...]}`).
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Emit a JSON report instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,

    /// Log output format (pretty or json).
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    let options = resolve_compare_options(cli.config.as_deref(), cli.ignore_const, &cli.ignore)?;
    diff_command(&cli.left, &cli.right, &options, cli.json)?;

    Ok(())
}
