use super::{CacheFileSource, SourceError};
use crate::index::{CacheIndexFile, IndexEntry, SubFile};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

/// Memoizes index fetches of the wrapped source. Archive reads pass through.
pub struct CachingSource<S> {
    inner: S,
    indices: RwLock<HashMap<u32, Arc<CacheIndexFile>>>,
}

impl<S: CacheFileSource> CachingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            indices: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: CacheFileSource> CacheFileSource for CachingSource<S> {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        if let Some(index) = self.indices.read().await.get(&major) {
            return Ok(Arc::clone(index));
        }

        let index = self.inner.get_cache_index(major).await?;
        debug!(major, entries = index.len(), "cached index");
        // a concurrent miss may have filled the slot, keep the first one
        let mut indices = self.indices.write().await;
        Ok(Arc::clone(indices.entry(major).or_insert(index)))
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        self.inner.get_file_archive(index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        inner: MemorySource,
        index_fetches: AtomicUsize,
    }

    #[async_trait]
    impl CacheFileSource for Counting {
        async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
            self.index_fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.get_cache_index(major).await
        }

        async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
            self.inner.get_file_archive(index).await
        }
    }

    #[tokio::test]
    async fn test_index_fetched_once() {
        let source = CachingSource::new(Counting {
            inner: MemorySource::new().with_archive(8, 1, [(0, vec![1])]),
            index_fetches: AtomicUsize::new(0),
        });

        for _ in 0..3 {
            assert_eq!(1, source.get_cache_index(8).await.unwrap().len());
        }
        assert_eq!(vec![1], source.get_file(8, 1, 0).await.unwrap());

        assert_eq!(1, source.inner().index_fetches.load(Ordering::SeqCst));
    }
}
