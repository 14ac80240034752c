//! Broadcast channel for run events.
//!
//! Observers subscribe before the run starts; slow receivers lag and lose the
//! oldest events instead of slowing the engine down.

use runner_types::RunEvent;
use tokio::sync::broadcast;

/// Default number of events buffered per receiver.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<RunEvent>,
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Creates a new receiver for all events published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event, returning the number of receivers it reached.
	/// Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: RunEvent,
	) -> Result<usize, broadcast::error::SendError<RunEvent>> {
		self.sender.send(event)
	}

	pub fn receiver_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use runner_types::RunStats;

	#[tokio::test]
	async fn test_publish_reaches_every_subscriber() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.subscribe();

		let event = RunEvent::StatsUpdated(RunStats::new(2));
		assert_eq!(bus.publish(event.clone()).unwrap(), 2);

		assert_eq!(first.recv().await.unwrap(), event);
		assert_eq!(second.recv().await.unwrap(), event);
	}

	#[test]
	fn test_publish_without_subscribers_fails() {
		let bus = EventBus::default();
		assert_eq!(bus.receiver_count(), 0);
		assert!(bus.publish(RunEvent::StatsUpdated(RunStats::new(1))).is_err());
	}
}
