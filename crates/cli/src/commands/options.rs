use std::path::Path;

use anyhow::{Context, Result};
use ctfdiff_core::config::load_diff_config;
use ctfdiff_core::format::TypeKind;
use ctfdiff_core::CompareOptions;

/// Merge the optional config file with the command-line qualifier flags.
pub fn resolve_compare_options(
    config: Option<&str>,
    ignore_const: bool,
    ignore: &[TypeKind],
) -> Result<CompareOptions> {
    let mut options = match config {
        Some(path) => load_diff_config(Path::new(path))?.compare_options()?,
        None => CompareOptions::new(),
    };

    if ignore_const {
        options = options.ignore_const();
    }
    for kind in ignore {
        options = options
            .ignoring(*kind)
            .with_context(|| format!("Invalid --ignore value '{kind}'"))?;
    }

    Ok(options)
}
