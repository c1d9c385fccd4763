use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use crate::error::{Error, Result};

/// Bounded FIFO hand-off between an event-producing thread and a consumer
/// that must never block. Pushing never waits: a full queue is reported as
/// [`Error::QueueFull`] and the message is dropped.
#[derive(Debug)]
pub struct NoteQueue<T> {
    name: String,
    sender: Sender<T>,
}

// Derived Clone would require T: Clone
impl<T> Clone for NoteQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// Consuming end of a [`NoteQueue`]
#[derive(Debug)]
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
}

impl<T> NoteQueue<T> {
    /// Create a queue holding at most `capacity` pending messages
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, QueueReceiver<T>) {
        let (sender, receiver) = bounded(capacity);
        (
            Self { name: name.into(), sender },
            QueueReceiver { receiver },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&self, msg: T) -> Result<()> {
        match self.sender.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::warn!("queue '{}' is full, dropping message", self.name);
                Err(Error::QueueFull(self.name.clone()))
            },
            // The consumer is gone (engine shut down); nothing left to deliver to.
            Err(TrySendError::Disconnected(_)) => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

impl<T> QueueReceiver<T> {
    /// Take everything pending right now without waiting for more.
    /// Bounded by the queue capacity.
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        self.receiver.try_iter()
    }

    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_and_bounded() {
        let (queue, receiver) = NoteQueue::new("test", 2);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        assert!(matches!(queue.push(3), Err(Error::QueueFull(name)) if name == "test"));
        assert_eq!(queue.len(), 2);

        let drained: Vec<i32> = receiver.drain().collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(queue.is_empty());
        assert_eq!(receiver.try_pop(), None);
    }

    #[test]
    fn producers_on_other_threads() {
        let (queue, receiver) = NoteQueue::new("threads", 64);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for j in 0..8 {
                        queue.push(i * 8 + j).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let mut drained: Vec<i32> = receiver.drain().collect();
        drained.sort();
        assert_eq!(drained, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn push_after_consumer_dropped_is_harmless() {
        let (queue, receiver) = NoteQueue::new("gone", 1);
        drop(receiver);
        assert!(queue.push(5).is_ok());
    }
}
