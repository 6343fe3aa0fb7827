//! Network-idle detection over a stream of request lifecycle events.
//!
//! The page counts as idle once no request has been in flight for the quiet
//! window. Backends translate their own protocol events into [`NetEvent`].

use std::collections::HashSet;
use std::time::Duration;

use futures_util::{Stream, StreamExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    Started(String),
    /// Finished or failed; both end the request.
    Finished(String),
}

/// Resolves when the in-flight set has stayed empty for `quiet`.
///
/// If the event source ends first, waits out the quiet window when nothing
/// is in flight and returns at once otherwise. Returns the number of
/// requests still in flight at exit.
pub async fn wait_for_network_idle<S>(events: S, quiet: Duration) -> usize
where
    S: Stream<Item = NetEvent>,
{
    futures_util::pin_mut!(events);
    let mut inflight: HashSet<String> = HashSet::new();
    let mut open = true;

    loop {
        if !open && !inflight.is_empty() {
            break;
        }
        tokio::select! {
            ev = events.next(), if open => match ev {
                Some(NetEvent::Started(id)) => {
                    inflight.insert(id);
                }
                Some(NetEvent::Finished(id)) => {
                    inflight.remove(&id);
                }
                None => open = false,
            },
            _ = tokio::time::sleep(quiet), if inflight.is_empty() => break,
        }
    }
    inflight.len()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use futures_util::stream;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    const QUIET: Duration = Duration::from_millis(500);

    fn channel_stream(rx: mpsc::UnboundedReceiver<NetEvent>) -> impl Stream<Item = NetEvent> {
        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|ev| (ev, rx)) })
    }

    fn started(id: &str) -> NetEvent {
        NetEvent::Started(id.into())
    }

    fn finished(id: &str) -> NetEvent {
        NetEvent::Finished(id.into())
    }

    #[tokio::test(start_paused = true)]
    async fn short_gaps_do_not_count_as_idle() {
        let (tx, rx) = mpsc::unbounded_channel();
        let feeder = tokio::spawn(async move {
            tx.send(started("a")).unwrap();
            sleep(Duration::from_millis(300)).await;
            tx.send(finished("a")).unwrap();
            // 300ms quiet, shorter than the window.
            sleep(Duration::from_millis(300)).await;
            tx.send(started("b")).unwrap();
            sleep(Duration::from_millis(700)).await;
            tx.send(finished("b")).unwrap();
            // Hold the sender so the source stays open.
            sleep(Duration::from_secs(60)).await;
            drop(tx);
        });

        let t0 = Instant::now();
        let left = wait_for_network_idle(channel_stream(rx), QUIET).await;
        let elapsed = t0.elapsed();

        assert_eq!(left, 0);
        assert!(elapsed >= Duration::from_millis(1800), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1900), "{elapsed:?}");
        feeder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_requests_must_all_finish() {
        let (tx, rx) = mpsc::unbounded_channel();
        let feeder = tokio::spawn(async move {
            tx.send(started("a")).unwrap();
            tx.send(started("b")).unwrap();
            sleep(Duration::from_millis(100)).await;
            tx.send(finished("a")).unwrap();
            sleep(Duration::from_millis(1000)).await;
            tx.send(finished("b")).unwrap();
            sleep(Duration::from_secs(60)).await;
            drop(tx);
        });

        let t0 = Instant::now();
        assert_eq!(wait_for_network_idle(channel_stream(rx), QUIET).await, 0);
        assert!(t0.elapsed() >= Duration::from_millis(1600));
        feeder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_source_with_outstanding_request_returns_at_once() {
        let t0 = Instant::now();
        let left = wait_for_network_idle(stream::iter(vec![started("x")]), QUIET).await;
        assert_eq!(left, 1);
        assert!(t0.elapsed() < QUIET);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_finish_is_ignored() {
        let t0 = Instant::now();
        let events = stream::iter(vec![finished("never-started")]);
        assert_eq!(wait_for_network_idle(events, QUIET).await, 0);
        assert!(t0.elapsed() >= QUIET);
    }
}
