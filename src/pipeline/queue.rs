//! Bounded utterance queue between segmentation and dispatch.

use crate::audio::segmenter::Utterance;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// What to do when the queue is full and a new utterance arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest queued-but-not-started utterance. The segmenter
    /// never blocks.
    #[default]
    DropOldest,
    /// Block the producer until space is available.
    Block,
}

/// Result of offering an utterance to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued, after evicting the utterance with this sequence number.
    DroppedOldest(u64),
    /// The consumer side is gone.
    Disconnected,
}

/// Producer half of the bounded utterance queue.
///
/// Holds a receiver clone so a full queue can be relieved by stealing the
/// oldest entry under [`OverflowPolicy::DropOldest`].
pub struct UtteranceQueue {
    tx: Sender<Utterance>,
    rx: Receiver<Utterance>,
    policy: OverflowPolicy,
}

impl UtteranceQueue {
    /// Creates a queue of the given depth and returns the producer plus the
    /// consumer receiver.
    pub fn new(depth: usize, policy: OverflowPolicy) -> (Self, Receiver<Utterance>) {
        let (tx, rx) = bounded(depth.max(1));
        let consumer = rx.clone();
        (Self { tx, rx, policy }, consumer)
    }

    /// Offers an utterance, applying the overflow policy when full.
    pub fn push(&self, utterance: Utterance) -> PushOutcome {
        match self.policy {
            OverflowPolicy::Block => match self.tx.send(utterance) {
                Ok(()) => PushOutcome::Queued,
                Err(_) => PushOutcome::Disconnected,
            },
            OverflowPolicy::DropOldest => {
                let mut pending = utterance;
                let mut dropped = None;
                loop {
                    match self.tx.try_send(pending) {
                        Ok(()) => {
                            return match dropped {
                                Some(seq) => PushOutcome::DroppedOldest(seq),
                                None => PushOutcome::Queued,
                            };
                        }
                        Err(TrySendError::Full(back)) => {
                            // Steal the oldest entry to make room. The
                            // consumer may win the race, in which case the
                            // retry simply succeeds.
                            if let Ok(evicted) = self.rx.try_recv() {
                                dropped = Some(evicted.sequence);
                            }
                            pending = back;
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            return PushOutcome::Disconnected;
                        }
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn utterance(sequence: u64) -> Utterance {
        Utterance {
            sequence,
            samples: vec![100i16; 160],
            created_at: Instant::now(),
        }
    }

    #[test]
    fn test_push_within_capacity() {
        let (queue, rx) = UtteranceQueue::new(4, OverflowPolicy::DropOldest);

        for seq in 0..4 {
            assert_eq!(queue.push(utterance(seq)), PushOutcome::Queued);
        }
        assert_eq!(queue.len(), 4);

        let received: Vec<u64> = rx.try_iter().map(|u| u.sequence).collect();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let (queue, rx) = UtteranceQueue::new(2, OverflowPolicy::DropOldest);

        assert_eq!(queue.push(utterance(0)), PushOutcome::Queued);
        assert_eq!(queue.push(utterance(1)), PushOutcome::Queued);
        assert_eq!(queue.push(utterance(2)), PushOutcome::DroppedOldest(0));

        let received: Vec<u64> = rx.try_iter().map(|u| u.sequence).collect();
        assert_eq!(received, vec![1, 2]);
    }

    #[test]
    fn test_repeated_overflow_keeps_newest() {
        let (queue, rx) = UtteranceQueue::new(1, OverflowPolicy::DropOldest);

        queue.push(utterance(0));
        assert_eq!(queue.push(utterance(1)), PushOutcome::DroppedOldest(0));
        assert_eq!(queue.push(utterance(2)), PushOutcome::DroppedOldest(1));

        let received: Vec<u64> = rx.try_iter().map(|u| u.sequence).collect();
        assert_eq!(received, vec![2]);
    }

    #[test]
    fn test_zero_depth_is_clamped_to_one() {
        let (queue, _rx) = UtteranceQueue::new(0, OverflowPolicy::DropOldest);
        assert_eq!(queue.push(utterance(0)), PushOutcome::Queued);
    }

    #[test]
    fn test_blocking_policy_delivers_all() {
        let (queue, rx) = UtteranceQueue::new(2, OverflowPolicy::Block);
        let handle = std::thread::spawn(move || {
            for seq in 0..6 {
                queue.push(utterance(seq));
            }
        });

        let received: Vec<u64> = rx.iter().take(6).map(|u| u.sequence).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4, 5]);
        handle.join().unwrap();
    }

    #[test]
    fn test_len_tracks_pending_entries() {
        let (queue, rx) = UtteranceQueue::new(4, OverflowPolicy::DropOldest);
        assert!(queue.is_empty());

        queue.push(utterance(0));
        queue.push(utterance(1));
        assert_eq!(queue.len(), 2);

        rx.recv().unwrap();
        assert_eq!(queue.len(), 1);
    }
}
