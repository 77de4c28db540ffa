use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// A minimal blocking, closeable, multi-sender/single-receiver FIFO queue.
///
/// This is a coordination primitive, not a bulk data pipe: the train pool
/// moves start tokens and per-round gradient reports through it. The channel
/// is "closed" exactly when the last `Sender` is dropped; a closed, drained
/// channel yields `None` from `recv`, which is the designed shutdown signal
/// for worker loops rather than an error.
struct Shared<T> {
    queue: VecDeque<T>,
    senders: usize,
}

struct Inner<T> {
    shared: Mutex<Shared<T>>,
    available: Condvar,
}

pub struct Sender<T> {
    inner: Arc<Inner<T>>,
}

pub struct Receiver<T> {
    inner: Arc<Inner<T>>,
}

/// Creates a connected `(Sender, Receiver)` pair over one shared queue.
/// The sender can be cloned freely; the receiver cannot.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let inner = Arc::new(Inner {
        shared: Mutex::new(Shared {
            queue: VecDeque::new(),
            senders: 1,
        }),
        available: Condvar::new(),
    });
    (
        Sender {
            inner: Arc::clone(&inner),
        },
        Receiver { inner },
    )
}

impl<T> Sender<T> {
    pub fn send(&self, value: T) {
        let mut shared = self.inner.shared.lock().unwrap();
        shared.queue.push_back(value);
        drop(shared);
        self.inner.available.notify_one();
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        let mut shared = self.inner.shared.lock().unwrap();
        shared.senders += 1;
        drop(shared);
        Sender {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let last_sender = {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.senders -= 1;
            shared.senders == 0
        };
        // The single receiver may be parked waiting on an empty queue; wake
        // it so it can observe closure.
        if last_sender {
            self.inner.available.notify_one();
        }
    }
}

impl<T> Receiver<T> {
    /// Blocks until an item is available or the channel closes.
    /// Returns `None` only when the queue is empty and no senders remain.
    pub fn recv(&self) -> Option<T> {
        let mut shared = self.inner.shared.lock().unwrap();
        while shared.queue.is_empty() && shared.senders > 0 {
            shared = self.inner.available.wait(shared).unwrap();
        }
        shared.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn sends_then_close_yields_items_then_none() {
        let (tx, rx) = channel();
        for i in 0..5 {
            tx.send(i);
        }
        drop(tx);

        for i in 0..5 {
            assert_eq!(rx.recv(), Some(i));
        }
        assert_eq!(rx.recv(), None);
        // Closure is sticky.
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn order_is_fifo_per_sender() {
        let (tx, rx) = channel();
        tx.send("first");
        tx.send("second");
        tx.send("third");
        assert_eq!(rx.recv(), Some("first"));
        assert_eq!(rx.recv(), Some("second"));
        assert_eq!(rx.recv(), Some("third"));
    }

    #[test]
    fn cloned_senders_keep_the_channel_open() {
        let (tx, rx) = channel();
        let tx2 = tx.clone();
        drop(tx);

        tx2.send(1);
        assert_eq!(rx.recv(), Some(1));
        drop(tx2);
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn recv_blocks_until_a_send_arrives() {
        let (tx, rx) = channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send(99);
        });
        // Parked until the delayed send lands.
        assert_eq!(rx.recv(), Some(99));
        handle.join().unwrap();
    }

    #[test]
    fn concurrent_senders_lose_no_items() {
        let (tx, rx) = channel();
        let senders = 4;
        let per_sender = 250;

        let mut handles = Vec::new();
        for s in 0..senders {
            let tx = tx.clone();
            handles.push(thread::spawn(move || {
                for i in 0..per_sender {
                    tx.send(s * per_sender + i);
                }
            }));
        }
        drop(tx);

        let mut received = Vec::new();
        while let Some(value) = rx.recv() {
            received.push(value);
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(received.len(), senders * per_sender);
        received.sort_unstable();
        received.dedup();
        assert_eq!(received.len(), senders * per_sender);
    }

    #[test]
    fn receiver_parked_on_empty_queue_observes_closure() {
        let (tx, rx) = channel::<u32>();
        let handle = thread::spawn(move || rx.recv());
        thread::sleep(Duration::from_millis(50));
        drop(tx);
        assert_eq!(handle.join().unwrap(), None);
    }
}
