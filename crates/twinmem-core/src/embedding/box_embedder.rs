//! BoxEmbedder -- object-safe dynamic dispatch wrapper for Embedder.
//!
//! Follows the same blanket-impl pattern as BoxLlmProvider:
//! 1. Define an object-safe `EmbedderDyn` trait with boxed futures
//! 2. Blanket-impl `EmbedderDyn` for all `T: Embedder`
//! 3. `BoxEmbedder` wraps `Box<dyn EmbedderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use twinmem_types::embedding::EmbedOptions;
use twinmem_types::error::EmbeddingError;

use super::embedder::Embedder;

/// Object-safe version of [`Embedder`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `Embedder`.
pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
        options: &'a EmbedOptions,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbeddingError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> Option<usize>;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
        options: &'a EmbedOptions,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbeddingError>> + Send + 'a>> {
        Box::pin(self.embed(text, options))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> Option<usize> {
        self.dimension()
    }
}

/// Type-erased embedder for runtime selection (Ollama vs fastembed).
///
/// Since `Embedder` uses RPITIT, it cannot be used as a trait object directly.
/// `BoxEmbedder` implements `Embedder` itself by delegating to the inner
/// `EmbedderDyn` trait object, so it can be wrapped by `DimensionAdapter`.
pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn + Send + Sync>,
}

impl BoxEmbedder {
    /// Wrap a concrete `Embedder` in a type-erased box.
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }
}

impl Embedder for BoxEmbedder {
    async fn embed(&self, text: &str, options: &EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        self.inner.embed_boxed(text, options).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    impl Embedder for FixedEmbedder {
        async fn embed(
            &self,
            text: &str,
            _options: &EmbedOptions,
        ) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32; 4])
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> Option<usize> {
            Some(4)
        }
    }

    #[tokio::test]
    async fn test_box_embedder_delegates() {
        let boxed = BoxEmbedder::new(FixedEmbedder);
        assert_eq!(boxed.model_name(), "fixed");
        assert_eq!(boxed.dimension(), Some(4));

        let v = boxed.embed("abc", &EmbedOptions::none()).await.unwrap();
        assert_eq!(v, vec![3.0; 4]);
    }

    /// Refuses any extra argument, like the fastembed backend.
    struct TextOnlyEmbedder;

    impl Embedder for TextOnlyEmbedder {
        async fn embed(
            &self,
            _text: &str,
            options: &EmbedOptions,
        ) -> Result<Vec<f32>, EmbeddingError> {
            if !options.is_empty() {
                return Err(EmbeddingError::UnsupportedArguments("memory_action".into()));
            }
            Ok(vec![1.0; 3])
        }

        fn model_name(&self) -> &str {
            "text-only"
        }

        fn dimension(&self) -> Option<usize> {
            Some(3)
        }
    }

    #[tokio::test]
    async fn test_adapter_over_box_embedder_retries_and_pads() {
        let adapter = crate::embedding::adapter::DimensionAdapter::new(
            BoxEmbedder::new(TextOnlyEmbedder),
            6,
        );
        let v = adapter
            .embed("Alex is a developer", &EmbedOptions::for_action("add"))
            .await
            .unwrap();
        assert_eq!(v, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    }
}
