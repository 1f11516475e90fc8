//! The limits book as a JSON file on disk.

use std::path::Path;

use alerts::LimitsBook;
use anyhow::Context;
use tracing::{debug, warn};

/// A missing file is an empty book.
pub fn load_limits(path: &Path) -> anyhow::Result<LimitsBook> {
    if !path.exists() {
        warn!(path = %path.display(), "limits file missing, starting with an empty book");
        return Ok(LimitsBook::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read limits file {}", path.display()))?;
    let book = LimitsBook::from_json(&text)
        .with_context(|| format!("parse limits file {}", path.display()))?;
    debug!(path = %path.display(), users = book.users().len(), "limits loaded");
    Ok(book)
}

/// Writes through a sibling temp file and a rename so readers never see a partial book.
pub fn save_limits(path: &Path, book: &LimitsBook) -> anyhow::Result<()> {
    let text = book.to_json_pretty()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replace limits file {}", path.display()))?;
    debug!(path = %path.display(), "limits saved");
    Ok(())
}
