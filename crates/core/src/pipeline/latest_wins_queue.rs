use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

/// Bounded FIFO that never blocks the producer.
///
/// When full, `push` evicts the oldest buffered item to admit the new one,
/// so under overload the consumer always sees the most recent items.
/// Built on a bounded crossbeam channel; the queue keeps its own receiver
/// handle so the producer side can evict.
pub struct LatestWinsQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> LatestWinsQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Inserts `item`, returning how many older items were evicted.
    pub fn push(&self, item: T) -> usize {
        let mut item = item;
        let mut evicted = 0;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return evicted,
                Err(TrySendError::Full(back)) => {
                    item = back;
                    // A concurrent consumer may have emptied a slot already.
                    if self.rx.try_recv().is_ok() {
                        evicted += 1;
                    }
                }
                // Both ends live in `self`, so the channel cannot disconnect.
                Err(TrySendError::Disconnected(_)) => return evicted,
            }
        }
    }

    /// Oldest buffered item, waiting up to `timeout`; `None` on timeout.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const SHORT: Duration = Duration::from_millis(10);

    #[test]
    fn test_fifo_order_within_capacity() {
        let q = LatestWinsQueue::new(2);
        q.push(1);
        q.push(2);
        assert_eq!(q.pop(SHORT), Some(1));
        assert_eq!(q.pop(SHORT), Some(2));
        assert_eq!(q.pop(SHORT), None);
    }

    #[test]
    fn test_five_pushes_keep_last_two_in_order() {
        let q = LatestWinsQueue::new(2);
        let mut evicted = 0;
        for i in 1..=5 {
            evicted += q.push(i);
        }
        assert_eq!(evicted, 3);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(SHORT), Some(4));
        assert_eq!(q.pop(SHORT), Some(5));
        assert_eq!(q.pop(SHORT), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let q = LatestWinsQueue::new(3);
        for i in 0..100 {
            q.push(i);
            assert!(q.len() <= 3);
        }
    }

    #[test]
    fn test_pop_times_out_when_empty() {
        let q: LatestWinsQueue<u8> = LatestWinsQueue::new(2);
        let start = Instant::now();
        assert_eq!(q.pop(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_zero_capacity_treated_as_one() {
        let q = LatestWinsQueue::new(0);
        q.push('a');
        q.push('b');
        assert_eq!(q.capacity(), 1);
        assert_eq!(q.pop(SHORT), Some('b'));
    }

    #[test]
    fn test_pop_wakes_on_push_from_other_thread() {
        let q = Arc::new(LatestWinsQueue::new(2));
        let producer = {
            let q = q.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                q.push(42);
            })
        };
        assert_eq!(q.pop(Duration::from_secs(2)), Some(42));
        producer.join().unwrap();
    }

    #[test]
    fn test_producer_burst_never_blocks_and_last_item_survives() {
        let q = Arc::new(LatestWinsQueue::new(2));
        let producer = {
            let q = q.clone();
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    q.push(i);
                }
            })
        };
        producer.join().unwrap();

        let mut drained = Vec::new();
        while let Some(v) = q.pop(SHORT) {
            drained.push(v);
        }
        assert_eq!(drained, vec![9_998, 9_999]);
    }
}
