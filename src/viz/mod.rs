//! Self-contained HTML artifacts: a clustered marker map of located people and a
//! collaboration network graph.

pub mod map;
pub mod network;
pub mod popup;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

pub use self::map::{MapOptions, MapVisualizer};
pub use self::network::{get_edge_color, NetworkColumns, NetworkOptions, NetworkVisualizer};

/// JSON for inlining into a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn write_html(path: &Path, html: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    fs::write(path, html).map_err(|err| Error::io(path, err))?;
    info!(path = %path.display(), bytes = html.len(), "wrote html");
    Ok(path.to_path_buf())
}
