use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing::warn;

use crate::error::RecordError;
use crate::types::push::Subscription;

pub(crate) const PUSH_DIR: &str = ".push";

#[derive(Debug)]
pub(crate) enum Listing {
    /// No push directory, or nothing in it.
    Disabled,
    Entries(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub(crate) struct SubscriptionRecord {
    pub(crate) path: PathBuf,
    pub(crate) modified: OffsetDateTime,
    pub(crate) subscription: Subscription,
}

/// Lists `<mailbox>/.push/` in the order the filesystem returns it.
///
/// A listing that fails part way is treated like a missing directory:
/// nothing from it is dispatched.
pub(crate) async fn list(mailbox: &Path) -> Listing {
    let dir = mailbox.join(PUSH_DIR);
    let mut read_dir = match tokio::fs::read_dir(&dir).await {
        Ok(read_dir) => read_dir,
        Err(_) => return Listing::Disabled,
    };

    let mut entries = Vec::new();
    let entries = loop {
        match read_dir.next_entry().await {
            Ok(Some(entry)) => entries.push(entry.path()),
            Ok(None) => break Ok(entries),
            Err(err) => {
                warn!(dir = %dir.display(), "failed to list subscriptions: {err}");
                break Err(err);
            }
        }
    };
    listing(entries)
}

fn listing(entries: io::Result<Vec<PathBuf>>) -> Listing {
    match entries {
        Ok(entries) if !entries.is_empty() => Listing::Entries(entries),
        _ => Listing::Disabled,
    }
}

pub(crate) async fn load(path: &Path) -> Result<SubscriptionRecord, RecordError> {
    let read_error = |source| RecordError::Read {
        path: path.to_path_buf(),
        source,
    };
    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .map_err(read_error)?;
    let contents = tokio::fs::read(path).await.map_err(read_error)?;
    let subscription =
        serde_json::from_slice(&contents).map_err(|source| RecordError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(SubscriptionRecord {
        path: path.to_path_buf(),
        modified: OffsetDateTime::from(modified),
        subscription,
    })
}
