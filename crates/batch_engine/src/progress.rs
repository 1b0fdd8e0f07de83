//! Progress observers
//!
//! The orchestrator reports every transition to one [`ProgressObserver`].
//! Rendering happens elsewhere: [`ChannelObserver`] forwards updates to a
//! renderer task so worker tasks never wait on the terminal.

use std::sync::Arc;
use std::time::Duration;

use contracts::{BatchSummary, ProgressEvent, ProgressObserver};
use tokio::sync::mpsc;

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Everything an observer can be told, as one message type
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    Started { total: usize, concurrency: usize },
    Item(ProgressEvent),
    Finished { summary: BatchSummary, elapsed: Duration },
}

/// Forwards updates into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: ProgressUpdate) {
        // A closed receiver only means nobody renders any more.
        let _ = self.tx.send(update);
    }
}

impl ProgressObserver for ChannelObserver {
    fn batch_started(&self, total: usize, concurrency: usize) {
        self.send(ProgressUpdate::Started { total, concurrency });
    }

    fn on_event(&self, event: ProgressEvent) {
        self.send(ProgressUpdate::Item(event));
    }

    fn batch_finished(&self, summary: &BatchSummary, elapsed: Duration) {
        self.send(ProgressUpdate::Finished {
            summary: *summary,
            elapsed,
        });
    }
}

/// Broadcasts to several observers in order
#[derive(Default, Clone)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProgressObserver for FanoutObserver {
    fn batch_started(&self, total: usize, concurrency: usize) {
        for observer in &self.observers {
            observer.batch_started(total, concurrency);
        }
    }

    fn on_event(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(event.clone());
        }
    }

    fn batch_finished(&self, summary: &BatchSummary, elapsed: Duration) {
        for observer in &self.observers {
            observer.batch_finished(summary, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ProgressKind;

    #[test]
    fn test_fanout_reaches_every_channel() {
        let (first, mut first_rx) = ChannelObserver::new();
        let (second, mut second_rx) = ChannelObserver::new();
        let fanout = FanoutObserver::new()
            .with(Arc::new(first))
            .with(Arc::new(second))
            .with(Arc::new(NoopObserver));
        assert_eq!(fanout.len(), 3);

        fanout.batch_started(2, 1);
        fanout.on_event(ProgressEvent {
            index: 0,
            label: "Spinach".into(),
            kind: ProgressKind::Processing,
        });

        for rx in [&mut first_rx, &mut second_rx] {
            assert_eq!(
                rx.try_recv().unwrap(),
                ProgressUpdate::Started {
                    total: 2,
                    concurrency: 1
                }
            );
            let ProgressUpdate::Item(event) = rx.try_recv().unwrap() else {
                panic!("expected item event");
            };
            assert_eq!(event.label, "Spinach");
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.batch_finished(&BatchSummary::default(), Duration::ZERO);
    }
}
