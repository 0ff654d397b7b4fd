//! Feeds files through a processor into a sink.

use anyhow::{Context, Result};
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::consts::{ATTR_FILENAME, ATTR_PATH};
use crate::item::WorkItem;
use crate::outcome::Failure;
use crate::processor::Processor;
use crate::routing::{Channel, Transfer};
use crate::sink::{DirectorySink, Summary};

/// Read `path` into a work item carrying `filename`, `path` and `extra`.
pub async fn load_item(path: &Path, extra: &[(String, String)]) -> Result<WorkItem> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(WorkItem::new(content)
        .with_attribute(ATTR_FILENAME, filename)
        .with_attribute(ATTR_PATH, path.display().to_string())
        .with_attributes(extra.iter().cloned()))
}

/// A file that couldn't be read, as a failure transfer with no content.
fn unreadable(path: &Path, extra: &[(String, String)], err: &anyhow::Error) -> Transfer {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let item = WorkItem::new(Vec::new())
        .with_attribute(ATTR_FILENAME, filename)
        .with_attribute(ATTR_PATH, path.display().to_string())
        .with_attributes(extra.iter().cloned());
    Transfer {
        channel: Channel::Failure,
        item,
        failure: Some(Failure::Unreadable {
            detail: format!("{err:#}"),
        }),
    }
}

/// Process every file with up to `concurrency` in flight. Unreadable files
/// and item-level failures land in the `failure` channel; only a
/// configuration error or a failed sink write stops the run.
pub async fn run(
    processor: &dyn Processor,
    sink: &DirectorySink,
    files: &[PathBuf],
    attributes: &[(String, String)],
    concurrency: usize,
) -> Result<Summary> {
    info!(
        processor = processor.name(),
        files = files.len(),
        concurrency,
        out = %sink.root().display(),
        "starting run"
    );

    let mut results = stream::iter(files)
        .map(|path| async move {
            let item = match load_item(path, attributes).await {
                Ok(item) => item,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %format!("{err:#}"),
                        "input unreadable"
                    );
                    return anyhow::Ok(vec![unreadable(path, attributes, &err)]);
                }
            };
            Ok(processor.process(item).await?)
        })
        .buffer_unordered(concurrency.max(1));

    let mut summary = Summary::default();
    while let Some(result) = results.next().await {
        let transfers = result?;
        for transfer in &transfers {
            sink.write(transfer).await?;
        }
        summary.record(&transfers);
    }

    info!(?summary, "run finished");
    Ok(summary)
}
