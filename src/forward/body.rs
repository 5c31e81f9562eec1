//! Body materialization.
//!
//! Drains a body stream to completion and hands back one contiguous buffer.
//! Chunks keep their arrival order. There is no streaming pass-through.

use axum::body::{Body, Bytes, HttpBody};
use axum::BoxError;

/// Collects whole bodies, optionally bounded.
#[derive(Debug, Clone, Copy)]
pub struct BodyCollector {
    limit: usize,
}

impl BodyCollector {
    /// `None` collects without a size cap.
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self {
            limit: max_bytes.unwrap_or(usize::MAX),
        }
    }

    /// Read `body` until it signals end of stream.
    ///
    /// Errors come from the producer (or from the cap, when one is set);
    /// callers decide which side of the exchange they belong to.
    pub async fn collect<B>(&self, body: B) -> Result<Bytes, axum::Error>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        axum::body::to_bytes(Body::new(body), self.limit).await
    }
}

impl Default for BodyCollector {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunked(chunks: Vec<&'static str>) -> Body {
        Body::from_stream(stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes()))),
        ))
    }

    #[tokio::test]
    async fn test_collects_chunks_in_order() {
        let collector = BodyCollector::default();
        let bytes = collector
            .collect(chunked(vec!["hello", " ", "world"]))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let bytes = BodyCollector::default().collect(Body::empty()).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_binary_bytes_untouched() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let bytes = BodyCollector::default()
            .collect(Body::from(payload.clone()))
            .await
            .unwrap();
        assert_eq!(bytes.to_vec(), payload);
    }

    #[tokio::test]
    async fn test_cap_rejects_oversized_body() {
        let collector = BodyCollector::new(Some(4));
        assert!(collector.collect(chunked(vec!["abc", "def"])).await.is_err());
    }

    #[tokio::test]
    async fn test_producer_error_surfaces() {
        let body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]));
        assert!(BodyCollector::default().collect(body).await.is_err());
    }
}
