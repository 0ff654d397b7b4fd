//! Writes routed transfers to disk and tallies them.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::consts::ATTR_FILENAME;
use crate::routing::{Channel, Transfer};

/// Lays transfers out as `<root>/<channel>/<name>`. Failed items also get a
/// `<name>.failure.json` sidecar saying why. Existing files are never
/// overwritten: a taken name gets a fingerprint suffix instead.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one transfer, returning the path of the content file.
    pub async fn write(&self, transfer: &Transfer) -> Result<PathBuf> {
        let dir = self.root.join(transfer.channel.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        let name = create_unique(
            &dir,
            &output_name(transfer),
            &transfer.item.fingerprint(),
            transfer.item.content(),
        )
        .await?;
        let path = dir.join(&name);

        if let Some(failure) = &transfer.failure {
            let sidecar = dir.join(format!("{name}.failure.json"));
            let body = json!({
                "kind": failure.kind(),
                "detail": failure.to_string(),
                "failure": failure,
            });
            tokio::fs::write(&sidecar, serde_json::to_vec_pretty(&body)?)
                .await
                .with_context(|| format!("writing {}", sidecar.display()))?;
        }
        Ok(path)
    }
}

/// The item's file name without any directory part, else its fingerprint.
fn output_name(transfer: &Transfer) -> String {
    transfer
        .item
        .attribute(ATTR_FILENAME)
        .and_then(|f| Path::new(f).file_name())
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| transfer.item.fingerprint())
}

/// Write `content` to a new file in `dir`, returning the name used. A taken
/// `base` becomes `<stem>-<fingerprint>`, then `<stem>-<fingerprint>-<n>`.
async fn create_unique(dir: &Path, base: &str, fingerprint: &str, content: &[u8]) -> Result<String> {
    let tag = &fingerprint[..fingerprint.len().min(12)];
    let mut attempt = 0;
    loop {
        let name = candidate_name(base, tag, attempt);
        let path = dir.join(&name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(content)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                file.flush()
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
        }
    }
}

fn candidate_name(base: &str, tag: &str, attempt: usize) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.to_string());
    let suffix = if attempt == 1 {
        format!("{stem}-{tag}")
    } else {
        format!("{stem}-{tag}-{attempt}")
    };
    match path.extension() {
        Some(ext) => format!("{suffix}.{}", ext.to_string_lossy()),
        None => suffix,
    }
}

/// Channel counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub items: usize,
    pub success: usize,
    pub failure: usize,
    pub extracted: usize,
}

impl Summary {
    /// Count the transfers produced for one item.
    pub fn record(&mut self, transfers: &[Transfer]) {
        self.items += 1;
        for t in transfers {
            match t.channel {
                Channel::Success => self.success += 1,
                Channel::Failure => self.failure += 1,
                Channel::Extracted => self.extracted += 1,
            }
        }
    }
}
