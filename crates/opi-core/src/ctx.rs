use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    cluster::{ClusterClient, Namespace, ObjectMeta},
    error::DesireError,
};

/// Run `fut` unless `ctx` is cancelled first.
///
/// A cancelled token aborts the in-flight call; whatever the call had already applied stays applied.
pub async fn guarded<T, E, F>(ctx: &CancellationToken, fut: F) -> Result<T, DesireError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DesireError>,
{
    if ctx.is_cancelled() {
        return Err(DesireError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(DesireError::Cancelled),
        res = fut => res.map_err(Into::into),
    }
}

/// Create `namespace` unless it already exists.
pub(crate) async fn ensure_namespace<C: ClusterClient>(
    ctx: &CancellationToken,
    client: &C,
    namespace: &str,
) -> Result<(), DesireError> {
    let ns = Namespace {
        metadata: ObjectMeta::named(namespace),
    };
    match guarded(ctx, client.create("", &ns)).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_already_exists() => {
            debug!(namespace, "namespace already exists");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        cluster::{MemoryCluster, ResourceKind, Verb},
        error::ClusterError,
    };

    #[tokio::test]
    async fn passes_result_through() {
        let ctx = CancellationToken::new();
        let out = guarded(&ctx, async { Ok::<_, ClusterError>(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let res = guarded(&ctx, async { Ok::<_, ClusterError>(()) }).await;
        assert!(matches!(res, Err(DesireError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_aborts_pending_call() {
        let ctx = CancellationToken::new();
        let child = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let res = guarded(&ctx, async {
            std::future::pending::<()>().await;
            Ok::<_, ClusterError>(())
        })
        .await;
        assert!(matches!(res, Err(DesireError::Cancelled)));
    }

    #[tokio::test]
    async fn ensure_namespace_is_idempotent() {
        let cluster = MemoryCluster::new();
        let ctx = CancellationToken::new();

        ensure_namespace(&ctx, &cluster, "asgard").await.unwrap();
        ensure_namespace(&ctx, &cluster, "asgard").await.unwrap();

        assert_eq!(cluster.count(ResourceKind::Namespace), 1);
        assert_eq!(cluster.calls(ResourceKind::Namespace, Verb::Create), 2);
    }
}
