//! Subscription loops.
//!
//! One task per inbound path. The loop decodes each message into the
//! envelope expected on that path and hands it to the owner; it keeps no
//! state of its own.

use crate::transport::Transport;
use protocol::{ChannelPaths, Envelope};
use tokio::task::JoinHandle;

/// Subscribes to the path for `E` and feeds every decodable envelope to
/// `on_envelope` until the subscription ends or the task is aborted.
///
/// The subscription is taken before this returns, so nothing sent after the
/// call can be missed.
pub(crate) fn spawn_dispatch<E, T, F>(
    transport: &T,
    paths: &ChannelPaths,
    mut on_envelope: F,
) -> JoinHandle<()>
where
    E: Envelope + Send + 'static,
    T: Transport + ?Sized,
    F: FnMut(E) + Send + 'static,
{
    let path = E::KIND.path_in(paths).to_string();
    let mut subscription = transport.subscribe(&path);

    tokio::spawn(async move {
        while let Some(content) = subscription.next().await {
            match E::decode(&content) {
                Ok(envelope) => on_envelope(envelope),
                Err(err) => {
                    tracing::warn!(
                        path = %path,
                        kind = %E::KIND,
                        error = %err,
                        "dropping undecodable envelope"
                    );
                }
            }
        }
        tracing::debug!(path = %path, "subscription ended");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use protocol::{CallId, Cancellation};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_dispatch_skips_garbage_and_keeps_running() {
        let (host, guest) = MemoryTransport::pair();
        let paths = ChannelPaths::default();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let task = spawn_dispatch::<Cancellation, _, _>(&guest, &paths, move |envelope| {
            let _ = seen_tx.send(envelope.identifier);
        });

        let id = CallId::new();
        host.send(&paths.cancellation, "{not json".to_string())
            .await
            .unwrap();
        host.send(&paths.cancellation, r#"{"wrong":"shape"}"#.to_string())
            .await
            .unwrap();
        host.send(
            &paths.cancellation,
            Cancellation::new(id.clone()).encode().unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(seen_rx.recv().await, Some(id));
        assert!(!task.is_finished());
        task.abort();
    }
}
