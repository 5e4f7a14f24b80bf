use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ports::AnalysisStorePort;
use crate::domain::analysis::{Analysis, AnalysisId};
use crate::domain::errors::{DomainError, DomainResult};

#[derive(Default)]
struct Inner {
    entries: HashMap<AnalysisId, Analysis>,
    order: VecDeque<AnalysisId>,
}

/// Bounded FIFO cache of analyses kept in process memory.
pub struct InMemoryAnalysisStore {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl InMemoryAnalysisStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: RwLock::new(Inner::default()) }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[async_trait]
impl AnalysisStorePort for InMemoryAnalysisStore {
    async fn insert(&self, analysis: Analysis) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        let id = analysis.id;
        if inner.entries.insert(id, analysis).is_none() {
            inner.order.push_back(id);
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                debug!("Evicted analysis {oldest}");
            }
        }
        Ok(())
    }

    async fn get(&self, id: &AnalysisId) -> DomainResult<Analysis> {
        self.inner
            .read()
            .await
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("analysis {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::DetectionSet;
    use image::RgbImage;
    use std::sync::Arc;

    fn analysis() -> Analysis {
        Analysis {
            id: AnalysisId::new(),
            image: Arc::new(RgbImage::new(2, 2)),
            detections: DetectionSet::default(),
            infer_ms: 0.0,
        }
    }

    #[tokio::test]
    async fn returns_what_was_stored() {
        let store = InMemoryAnalysisStore::new(2);
        let a = analysis();
        let id = a.id;
        store.insert(a).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let store = InMemoryAnalysisStore::new(2);
        let ids: Vec<_> = (0..3).map(|_| analysis()).collect();
        let keys: Vec<_> = ids.iter().map(|a| a.id).collect();
        for a in ids {
            store.insert(a).await.unwrap();
        }

        assert_eq!(store.len().await, 2);
        assert!(matches!(store.get(&keys[0]).await, Err(DomainError::NotFound(_))));
        assert!(store.get(&keys[1]).await.is_ok());
        assert!(store.get(&keys[2]).await.is_ok());
    }
}
