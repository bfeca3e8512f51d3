//! Process-wide service registry
//!
//! The embedding provider and the vector index are expensive to construct
//! and safe to share once built. Each lives behind an async once-cell: the
//! first caller runs the factory, concurrent callers wait for that same
//! initialization, everyone afterwards gets the ready handle without locking.
//! A failed initialization leaves the cell empty so a later call can retry.

use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::embedding::{EmbeddingEngine, EmbeddingProvider};
use crate::errors::{RagError, Result};
use crate::vector_index::{QdrantIndex, VectorIndex};

type EmbedderFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingProvider>>> + Send + Sync>;
type IndexFactory = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn VectorIndex>>> + Send + Sync>;

/// Lazily-initialized shared providers
pub struct ServiceRegistry {
    embedder: OnceCell<Arc<dyn EmbeddingProvider>>,
    index: OnceCell<Arc<dyn VectorIndex>>,
    embedder_factory: Option<EmbedderFactory>,
    index_factory: Option<IndexFactory>,
}

impl ServiceRegistry {
    /// Registry that loads the local encoder and connects to Qdrant on first use
    pub fn from_config(config: &Config) -> Self {
        let embedding = config.embedding.clone();
        let dimension = config.vector_store.dimension;
        let vector_store = config.vector_store.clone();

        Self::lazy(
            move || {
                let embedding = embedding.clone();
                async move {
                    let engine = tokio::task::spawn_blocking(move || {
                        EmbeddingEngine::load(&embedding, dimension)
                    })
                    .await
                    .map_err(|e| RagError::Model(format!("Model loading task failed: {}", e)))??;
                    Ok::<_, RagError>(Arc::new(engine) as Arc<dyn EmbeddingProvider>)
                }
            },
            move || {
                let vector_store = vector_store.clone();
                async move {
                    let index = QdrantIndex::connect(&vector_store).await?;
                    Ok::<_, RagError>(Arc::new(index) as Arc<dyn VectorIndex>)
                }
            },
        )
    }

    /// Registry with custom factories; each runs at most once successfully
    pub fn lazy<E, EFut, I, IFut>(embedder: E, index: I) -> Self
    where
        E: Fn() -> EFut + Send + Sync + 'static,
        EFut: Future<Output = Result<Arc<dyn EmbeddingProvider>>> + Send + 'static,
        I: Fn() -> IFut + Send + Sync + 'static,
        IFut: Future<Output = Result<Arc<dyn VectorIndex>>> + Send + 'static,
    {
        Self {
            embedder: OnceCell::new(),
            index: OnceCell::new(),
            embedder_factory: Some(Box::new(move || embedder().boxed())),
            index_factory: Some(Box::new(move || index().boxed())),
        }
    }

    /// Registry around providers that are already initialized
    pub fn with_providers(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder: OnceCell::from(embedder),
            index: OnceCell::from(index),
            embedder_factory: None,
            index_factory: None,
        }
    }

    /// Shared embedding provider, initializing it on first call
    pub async fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.embedder
            .get_or_try_init(|| async {
                match &self.embedder_factory {
                    Some(factory) => factory().await,
                    None => Err(RagError::Model("No embedding provider configured".to_string())),
                }
            })
            .await
            .cloned()
    }

    /// Shared vector index, connecting on first call
    pub async fn index(&self) -> Result<Arc<dyn VectorIndex>> {
        self.index
            .get_or_try_init(|| async {
                match &self.index_factory {
                    Some(factory) => factory().await,
                    None => Err(RagError::Storage("No vector index configured".to_string())),
                }
            })
            .await
            .cloned()
    }

    /// Initialize both providers concurrently; used at startup
    pub async fn warm_up(&self) -> Result<()> {
        futures_util::future::try_join(self.embedder(), self.index()).await?;
        tracing::info!("All services initialized successfully");
        Ok(())
    }

    /// True once both providers are ready
    pub fn is_ready(&self) -> bool {
        self.embedder.initialized() && self.index.initialized()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::vector_index::{Distance, InMemoryIndex};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Two-dimensional encoder that maps every text to the same vector
    pub(crate) struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn counting_registry(calls: Arc<AtomicUsize>) -> ServiceRegistry {
        ServiceRegistry::lazy(
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, RagError>(Arc::new(FixedEmbedder) as Arc<dyn EmbeddingProvider>)
                }
            },
            || async {
                Ok::<_, RagError>(
                    Arc::new(InMemoryIndex::new(2, Distance::Cosine)) as Arc<dyn VectorIndex>
                )
            },
        )
    }

    #[tokio::test]
    async fn test_concurrent_first_access_initializes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(counting_registry(Arc::clone(&calls)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.embedder().await.map(|e| e.dimension()) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let registry = ServiceRegistry::lazy(
            || async { Ok::<_, RagError>(Arc::new(FixedEmbedder) as Arc<dyn EmbeddingProvider>) },
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(RagError::Storage("connection refused".into()))
                    } else {
                        Ok(Arc::new(InMemoryIndex::new(2, Distance::Cosine)) as Arc<dyn VectorIndex>)
                    }
                }
            },
        );

        assert!(registry.warm_up().await.unwrap_err().is_storage());
        assert!(!registry.is_ready());

        registry.warm_up().await.unwrap();
        assert!(registry.is_ready());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_providers_is_ready() {
        let registry = ServiceRegistry::with_providers(
            Arc::new(FixedEmbedder),
            Arc::new(InMemoryIndex::new(2, Distance::Cosine)),
        );
        assert!(registry.is_ready());
        assert!(registry.index().await.is_ok());
    }
}
