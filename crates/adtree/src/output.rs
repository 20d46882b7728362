use anyhow::{Context, Result};
use membership_tree::tree::{TreeError, TreeObject, TreeOutput};
use std::io::Write;

/// Print trees as indented text, one blank line between roots
pub fn write_text<W: Write>(out: &mut W, outputs: &[&TreeOutput]) -> Result<()> {
    for (i, output) in outputs.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        for line in output.lines() {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// Print every node of every tree as one JSON array
pub fn write_json<W: Write>(out: &mut W, outputs: &[&TreeOutput]) -> Result<()> {
    let nodes: Vec<&TreeObject> = outputs.iter().flat_map(|output| &output.nodes).collect();
    serde_json::to_writer_pretty(&mut *out, &nodes).context("Failed to write JSON output")?;
    writeln!(out)?;
    Ok(())
}

/// Print warnings and diagnostics of one finished tree
pub fn write_notices<W: Write>(err: &mut W, output: &TreeOutput) -> Result<()> {
    for diagnostic in &output.diagnostics {
        writeln!(err, "WARNING: {diagnostic}")?;
    }
    if let Some(warning) = output.truncation_warning() {
        writeln!(err, "WARNING: {warning}")?;
    }
    Ok(())
}

/// Print a failed root operation
pub fn write_error<W: Write>(err: &mut W, identity: &str, error: &TreeError) -> Result<()> {
    writeln!(err, "ERROR [{}] {identity}: {error}", error.category())?;
    Ok(())
}
