//! Invocation of the external protein grouping program
//!
//! The program is called as `<program> <exchange files>... <output>`, which
//! is the calling convention of ProteinProphet.

use anyhow::{bail, ensure, Context};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

pub const COMBINED_FILE: &str = "combined.prot.xml";

/// Run `program` over every exchange file, writing a combined protein
/// grouping to `output`. Returns the path of the combined file
pub fn combine(program: &str, exchange_files: &[PathBuf], output: &Path) -> anyhow::Result<PathBuf> {
    ensure!(
        !exchange_files.is_empty(),
        "no `*.pep.xml` files found in any experiment: cannot build a combined protein grouping. \
         Supply a pre-built file with `--combined`"
    );

    let start = Instant::now();
    log::info!(
        "running `{}` on {} exchange files",
        program,
        exchange_files.len()
    );

    let result = Command::new(program)
        .args(exchange_files)
        .arg(output)
        .output()
        .with_context(|| format!("Failed to execute protein grouping program `{program}`"))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        let detail = match stderr.is_empty() {
            true => format!("exit status {}", result.status),
            false => stderr,
        };
        bail!("protein grouping program `{}` failed: {}", program, detail);
    }
    ensure!(
        output.is_file(),
        "protein grouping program `{}` did not create `{}`",
        program,
        output.display()
    );

    log::info!(
        "- protein grouping: {:8} ms",
        start.elapsed().as_millis()
    );
    Ok(output.to_path_buf())
}
