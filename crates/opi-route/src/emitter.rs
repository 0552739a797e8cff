use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    message::RegistryMessage,
    publisher::{Publisher, REGISTER_SUBJECT},
};

/// Drains route batches and publishes them one message at a time.
///
/// Failures are logged and the message is dropped; the next desire of the app re-sends it.
pub struct RouteEmitter {
    publisher: Arc<dyn Publisher>,
    work: mpsc::Receiver<Vec<RegistryMessage>>,
}

impl RouteEmitter {
    pub fn new(publisher: Arc<dyn Publisher>, work: mpsc::Receiver<Vec<RegistryMessage>>) -> Self {
        Self { publisher, work }
    }

    /// Run until `ctx` is cancelled or every sender is gone.
    pub async fn run(mut self, ctx: CancellationToken) {
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    debug!("route emitter cancelled");
                    break;
                }
                batch = self.work.recv() => match batch {
                    Some(batch) => emit(self.publisher.as_ref(), &batch).await,
                    None => {
                        debug!("route queue closed");
                        break;
                    }
                },
            }
        }
    }
}

async fn emit(publisher: &dyn Publisher, batch: &[RegistryMessage]) {
    for msg in batch {
        let payload = match serde_json::to_vec(msg) {
            Ok(p) => p,
            Err(e) => {
                warn!(app = %msg.app, error = %e, "failed to encode route message");
                continue;
            }
        };

        match publisher.publish(REGISTER_SUBJECT, &payload).await {
            Ok(()) => trace!(app = %msg.app, uris = ?msg.uris, "route published"),
            Err(e) => warn!(app = %msg.app, error = %e, "failed to publish route"),
        }
    }
}
