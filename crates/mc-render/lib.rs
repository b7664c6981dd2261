//! Graph export: DOT generation and, where the `dot` binary is on
//! `$PATH`, SVG rendering on top of it.
//!
//! Rendering is an external collaborator (spec.md §1, §6): failures
//! here must never block the analysis output, so every fallible step
//! returns `Option` and logs a warning instead of propagating an
//! error (spec.md §7 — "Rendering errors (DOT/SVG) are swallowed").

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use mc_logger::Logger;
use mc_pg::Pg;
use mc_str::Interner;

/// Escape a label for embedding in a DOT `label="..."` attribute.
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `pg` as a DOT `digraph`, edges in the same DFS-edge order the
/// CLI's `u v => action` printer uses (spec.md §2 supplement: keeping
/// both in sync), labeled nodes `▷`/`1..n`/`◀` and edges by their
/// action's printable form.
pub fn to_dot(pg: &Pg, interner: &Interner, graph_name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph {} {{\n", escape_dot(graph_name)));
    out.push_str("  node [shape=circle];\n");

    for (u, v, action) in pg.dfs_edges() {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            pg.label(u).display(),
            pg.label(v).display(),
            escape_dot(&action.display(interner))
        ));
    }

    out.push_str("}\n");
    out
}

/// Write the DOT file for `pg` to `dot_path`, deleting any existing
/// artifact first (spec.md §5 — "existing artifacts are deleted first
/// if present"), then attempt to render an SVG next to it via the
/// system `dot` tool. Returns the SVG path if rendering succeeded;
/// `None` (with a logged warning) if the DOT file couldn't be written
/// or `dot` isn't available — either way the caller's analysis output
/// is unaffected.
pub fn export(pg: &Pg, interner: &Interner, dot_path: &Path, logger: &Logger) -> Option<PathBuf> {
    let graph_name = dot_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("program_graph");
    let dot_src = to_dot(pg, interner, graph_name);

    if dot_path.exists() {
        if let Err(e) = fs::remove_file(dot_path) {
            logger.log_debug(&format!("mc-render: could not remove stale {:?}: {}", dot_path, e));
        }
    }
    if let Err(e) = fs::write(dot_path, &dot_src) {
        logger.log(&format!("warning: could not write DOT file {:?}: {}", dot_path, e));
        return None;
    }

    render_svg(dot_path, logger)
}

fn render_svg(dot_path: &Path, logger: &Logger) -> Option<PathBuf> {
    let svg_path = dot_path.with_extension("svg");
    if svg_path.exists() {
        if let Err(e) = fs::remove_file(&svg_path) {
            logger.log_debug(&format!("mc-render: could not remove stale {:?}: {}", svg_path, e));
        }
    }

    let output = Command::new("dot")
        .arg("-Tsvg")
        .arg(dot_path)
        .arg("-o")
        .arg(&svg_path)
        .output();

    match output {
        Ok(out) if out.status.success() => Some(svg_path),
        Ok(out) => {
            logger.log(&format!(
                "warning: 'dot' exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr)
            ));
            None
        }
        Err(e) => {
            logger.log_debug(&format!("mc-render: 'dot' binary unavailable ({e}), skipping SVG"));
            None
        }
    }
}
