//! Status source boundary.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::GatewayStatus;

/// A remote that reports the current status of every gateway it knows.
///
/// Implementations perform exactly one request per call and must classify
/// timeouts and connection failures as [`SourceError::Timeout`] /
/// [`SourceError::Connect`], distinct from a successful answer that simply
/// lacks a gateway.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Identity of the remote (e.g. the router URL), for logs and state scoping.
    fn identity(&self) -> &str;

    async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError>;

    /// Best-effort enumeration for selection lists. Never fails.
    async fn list_entities(&self) -> Vec<GatewayStatus> {
        match self.fetch_statuses().await {
            Ok(statuses) => statuses,
            Err(e) => {
                tracing::debug!("listing gateways from {} failed: {e}", self.identity());
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for &T {
    fn identity(&self) -> &str {
        (**self).identity()
    }

    async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
        (**self).fetch_statuses().await
    }

    async fn list_entities(&self) -> Vec<GatewayStatus> {
        (**self).list_entities().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl StatusSource for Failing {
        fn identity(&self) -> &str {
            "https://router.test"
        }

        async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
            Err(SourceError::Http { status: 401 })
        }
    }

    struct Fixed;

    #[async_trait]
    impl StatusSource for Fixed {
        fn identity(&self) -> &str {
            "fixed"
        }

        async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
            Ok(vec![GatewayStatus {
                name: "WAN".into(),
                status: "none".into(),
                status_description: "Online".into(),
            }])
        }
    }

    #[tokio::test]
    async fn list_entities_swallows_errors() {
        assert!(Failing.list_entities().await.is_empty());
    }

    #[tokio::test]
    async fn list_entities_passes_through_statuses() {
        async fn list<S: StatusSource>(source: S) -> Vec<GatewayStatus> {
            source.list_entities().await
        }

        let fixed = Fixed;
        let listed = list(&fixed).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "WAN");
    }
}
