//! Bulk transfer of source directories into the publication tree.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::data_type::DataType;
use crate::error::{Result, StagingError};
use crate::path::PathResolver;

/// How a file reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Move,
    Copy,
    /// Symbolic link to the absolute source path
    #[default]
    Link,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
            TransferMode::Link => "link",
        };
        f.write_str(name)
    }
}

impl FromStr for TransferMode {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "move" => Ok(TransferMode::Move),
            "copy" => Ok(TransferMode::Copy),
            "link" => Ok(TransferMode::Link),
            _ => Err(StagingError::InvalidTransferMode(s.to_string())),
        }
    }
}

/// Transfer engine settings.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub mode: TransferMode,
    /// Replace existing destinations instead of skipping them
    pub overwrite: bool,
    /// Concurrent transfers
    pub workers: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            mode: TransferMode::Link,
            overwrite: false,
            workers: 8,
        }
    }
}

/// Summary of one transfer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub transferred: usize,
    pub skipped: usize,
    pub missing: usize,
    /// Destination directories that received at least one file
    pub directories: BTreeSet<PathBuf>,
}

impl TransferRecord {
    fn merge(&mut self, other: TransferRecord) {
        self.transferred += other.transferred;
        self.skipped += other.skipped;
        self.missing += other.missing;
        self.directories.extend(other.directories);
    }
}

enum Outcome {
    Transferred(PathBuf),
    Skipped,
    Missing,
}

/// Moves, copies or links source directories into canonical destinations.
pub struct TransferEngine {
    resolver: PathResolver,
    options: TransferOptions,
    completed: Arc<AtomicUsize>,
}

impl TransferEngine {
    pub fn new(resolver: PathResolver, options: TransferOptions) -> Self {
        Self {
            resolver,
            options,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of items handled so far, for progress reporting.
    pub fn progress(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.completed)
    }

    /// Transfer every (data type, source directory) pair.
    ///
    /// Stops at the first OS-level failure and reports the failing pair.
    #[instrument(skip(self, sources), fields(mode = %self.options.mode, overwrite = self.options.overwrite))]
    pub async fn transfer(&self, sources: &[(DataType, PathBuf)]) -> Result<TransferRecord> {
        let mut record = TransferRecord::default();
        for (data_type, source_dir) in sources {
            let partial = self.transfer_dir(*data_type, source_dir).await?;
            info!(
                data_type = %data_type,
                source = %source_dir.display(),
                transferred = partial.transferred,
                skipped = partial.skipped,
                missing = partial.missing,
                "Transferred data type"
            );
            record.merge(partial);
        }
        Ok(record)
    }

    async fn transfer_dir(&self, data_type: DataType, source_dir: &Path) -> Result<TransferRecord> {
        let items = list_items(source_dir).await?;
        debug!(data_type = %data_type, items = items.len(), "Listed source directory");

        let workers = self.options.workers.max(1);
        let outcomes: Vec<Outcome> = stream::iter(items)
            .map(|(src, name)| {
                let dst = self.resolver.resolve(data_type, &name);
                async move {
                    let outcome = transfer_one(&src, &dst, self.options.mode, self.options.overwrite).await;
                    self.completed.fetch_add(1, Ordering::Relaxed);
                    outcome
                }
            })
            .buffer_unordered(workers)
            .try_collect()
            .await?;

        let mut record = TransferRecord::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Transferred(dir) => {
                    record.transferred += 1;
                    record.directories.insert(dir);
                }
                Outcome::Skipped => record.skipped += 1,
                Outcome::Missing => record.missing += 1,
            }
        }
        Ok(record)
    }
}

/// Sorted (path, file name) pairs for every non-directory entry.
async fn list_items(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut items = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            debug!(path = %entry.path().display(), "Skipping subdirectory");
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => items.push((entry.path(), name)),
            Err(name) => warn!(name = ?name, "Skipping non UTF-8 file name"),
        }
    }
    items.sort();
    Ok(items)
}

async fn transfer_one(src: &Path, dst: &Path, mode: TransferMode, overwrite: bool) -> Result<Outcome> {
    let fail = |source: io::Error| StagingError::Transfer {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };

    // symlink_metadata so a dangling link still counts as present
    let dst_present = fs::symlink_metadata(dst).await.is_ok();
    if dst_present && !overwrite {
        debug!(dst = %dst.display(), "Destination exists, skipping");
        return Ok(Outcome::Skipped);
    }

    if fs::symlink_metadata(src).await.is_err() {
        warn!(src = %src.display(), "Source file does not exist, skipping");
        return Ok(Outcome::Missing);
    }

    let parent = dst.parent().map(Path::to_path_buf).unwrap_or_default();
    fs::create_dir_all(&parent).await.map_err(fail)?;

    if dst_present {
        fs::remove_file(dst).await.map_err(fail)?;
    }

    match mode {
        TransferMode::Move => {
            if fs::rename(src, dst).await.is_err() {
                // rename failed (likely cross-device), fall back to copy+delete
                fs::copy(src, dst).await.map_err(fail)?;
                fs::remove_file(src).await.map_err(fail)?;
            }
        }
        TransferMode::Copy => {
            fs::copy(src, dst).await.map_err(fail)?;
        }
        TransferMode::Link => {
            let target = fs::canonicalize(src).await.map_err(fail)?;
            symlink(&target, dst).await.map_err(fail)?;
        }
    }

    Ok(Outcome::Transferred(parent))
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink_file(target, link).await
}

/// Move every `*.nc` file from a warehouse directory into an empty
/// publication directory. Returns the number of files moved.
#[instrument]
pub async fn publish_dataset(src: &Path, dst: &Path) -> Result<usize> {
    let src_meta = fs::metadata(src)
        .await
        .map_err(|_| StagingError::Publish(format!("source {} does not exist", src.display())))?;
    if !src_meta.is_dir() {
        return Err(StagingError::Publish(format!("source {} is not a directory", src.display())));
    }
    if is_empty_dir(src).await? {
        return Err(StagingError::Publish(format!("source {} is empty", src.display())));
    }

    let dst_meta = fs::metadata(dst)
        .await
        .map_err(|_| StagingError::Publish(format!("destination {} does not exist", dst.display())))?;
    if !dst_meta.is_dir() {
        return Err(StagingError::Publish(format!("destination {} is not a directory", dst.display())));
    }
    if !is_empty_dir(dst).await? {
        return Err(StagingError::Publish(format!("destination {} is not empty", dst.display())));
    }

    let mut moved = 0;
    for (path, name) in list_items(src).await? {
        if !name.ends_with(".nc") {
            continue;
        }
        let target = dst.join(&name);
        fs::rename(&path, &target).await.map_err(|source| StagingError::Transfer {
            src: path.clone(),
            dst: target.clone(),
            source,
        })?;
        moved += 1;
    }

    info!(files = moved, dst = %dst.display(), "Published dataset");
    Ok(moved)
}

async fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_none())
}
