// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! On-disk attachment cache.
//!
//! A cached file is never fetched again: its existence is the only state.

use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::Result;
use crate::model::{Media, Message};

pub(crate) fn cache_path(dir: &Path, media: &Media) -> PathBuf {
    dir.join(media.cache_file_name())
}

/// Outcome of [`ensure_cached`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Cached {
    /// Already on disk before the call.
    Hit,
    /// Downloaded by this call.
    Downloaded,
}

/// Make sure the media of `message` is present at `path`.
///
/// The file is written under a temporary name and renamed into place so a
/// failed transfer never leaves a partial cache entry.
pub(crate) async fn ensure_cached<B: Backend>(
    backend: &B,
    message: &Message,
    path: &Path,
) -> Result<Cached> {
    // Checked right before the download. Two concurrent renders of the same
    // attachment may both fetch it; the rename makes that harmless.
    if tokio::fs::try_exists(path).await? {
        return Ok(Cached::Hit);
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = backend.download_media(message, &partial).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    tokio::fs::rename(&partial, path).await?;
    tracing::debug!(message = message.id, path = %path.display(), "Downloaded attachment");
    Ok(Cached::Downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::Op;
    use crate::backend::memory::testing::*;

    #[test]
    fn test_cache_path_uses_extension() {
        let media = Media {
            id: 5,
            mime_type: Some("image/webp".into()),
        };
        assert_eq!(
            cache_path(Path::new("/tmp/dl"), &media),
            PathBuf::from("/tmp/dl/5.webp")
        );
    }

    #[tokio::test]
    async fn test_second_call_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.png");
        std::fs::write(&source, b"data").unwrap();
        let backend = backend();
        backend.add_media(7, source);

        let target = dir.path().join("cache").join("7.png");
        let message = photo(30, ALICE, 7, "");
        assert_eq!(
            ensure_cached(&backend, &message, &target).await.unwrap(),
            Cached::Downloaded
        );
        assert_eq!(
            ensure_cached(&backend, &message, &target).await.unwrap(),
            Cached::Hit
        );
        assert_eq!(backend.download_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend();
        backend.fail(Op::Download);

        let target = dir.path().join("7.png");
        assert!(
            ensure_cached(&backend, &photo(30, ALICE, 7, ""), &target)
                .await
                .is_err()
        );
        assert!(!target.exists());
        assert!(!dir.path().join("7.png.part").exists());
    }
}
