// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The bounded byte channel that decouples the input collector thread from consumers.
//! See [`BoundedByteChannel`] for the locking protocol.

use super::ByteRingBuffer;
use std::{sync::{Condvar, Mutex, MutexGuard, PoisonError,
                 atomic::{AtomicBool, Ordering}},
          time::{Duration, Instant}};

/// How a consumer wants to wait for a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Return [`PopError::Empty`] immediately if nothing is buffered.
    NonBlocking,
    /// Wait until a byte arrives, the channel closes, or `timeout` elapses. `None` waits
    /// until one of the first two happens.
    Blocking { timeout: Option<Duration> },
}

impl ReadMode {
    #[must_use]
    pub fn blocking_with_timeout(timeout: Duration) -> Self {
        ReadMode::Blocking {
            timeout: Some(timeout),
        }
    }

    #[must_use]
    pub fn blocking_forever() -> Self { ReadMode::Blocking { timeout: None } }
}

/// Why [`BoundedByteChannel::pop()`] returned without a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Non-blocking read on an empty buffer.
    Empty,
    /// Blocking read whose timeout elapsed. Retryable.
    TimedOut,
    /// The channel was closed (pipeline stopped or errored).
    Closed,
}

/// What happened to a byte handed to [`BoundedByteChannel::push()`].
///
/// Neither drop variant is an error: the producer must never block, so a full buffer
/// sheds the newest byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Stored,
    DroppedFull,
    DroppedClosed,
}

impl PushOutcome {
    #[must_use]
    pub fn is_stored(self) -> bool { self == PushOutcome::Stored }
}

/// What a consumer sees when the channel is closed while bytes are still buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::AsRefStr)]
pub enum ClosePolicy {
    /// Keep handing out buffered bytes; report [`PopError::Closed`] once empty. Nothing
    /// typed before a graceful shutdown is lost.
    #[default]
    DrainThenClose,
    /// Report [`PopError::Closed`] right away, discarding buffered bytes.
    CloseImmediately,
}

/// Fixed-capacity byte FIFO shared between exactly one producer (the input collector
/// thread) and a single logical consumer.
///
/// # Locking protocol
///
/// - One [`Mutex`] guards the whole [`ByteRingBuffer`]: both indices and the wrap flag
///   are updated together, never field by field.
/// - [`push()`] stores under the lock, releases it, then [`Condvar::notify_one()`].
/// - [`pop()`] in blocking mode waits on the [`Condvar`] in slices of at most
///   `recheck_interval`, re-evaluating the predicate on every wake (spurious wakeups
///   are possible, and the closed flag may have been set without a notification).
/// - [`close()`] sets the closed flag, then takes the lock before
///   [`Condvar::notify_all()`]. Taking the lock means a consumer that checked the flag
///   but has not started waiting yet can't miss the broadcast.
/// - [`mark_closed_lock_free()`] only sets the flag. Waiters notice it within one
///   `recheck_interval`.
///
/// ```text
/// collector thread            channel (mutex + condvar)            consumer thread
/// ────────────────            ─────────────────────────            ───────────────
/// push(b) ──lock──▶ ring.push(b) ──unlock──▶ notify_one ──wake──▶ ring.pop() → Ok(b)
/// close() ──flag──▶ lock ──▶ notify_all ─────────────────wake──▶ Err(Closed)
/// ```
///
/// # Concurrency
///
/// Concurrent [`push()`] from two threads is not supported by design (the pipeline has
/// one producer). Concurrent [`pop()`] from several threads is memory safe, but which
/// consumer gets which byte is unspecified, so interleaved multi-byte sequences will be
/// split across consumers.
///
/// [`close()`]: Self::close
/// [`mark_closed_lock_free()`]: Self::mark_closed_lock_free
/// [`pop()`]: Self::pop
/// [`push()`]: Self::push
#[derive(Debug)]
pub struct BoundedByteChannel {
    ring: Mutex<ByteRingBuffer>,
    data_available: Condvar,
    closed: AtomicBool,
    close_policy: ClosePolicy,
    recheck_interval: Duration,
}

/// Floor for `recheck_interval`. A zero slice would turn blocking waits into a spin.
pub const MIN_RECHECK_INTERVAL: Duration = Duration::from_millis(1);

impl BoundedByteChannel {
    #[must_use]
    pub fn new(capacity: usize, close_policy: ClosePolicy, recheck_interval: Duration) -> Self {
        Self {
            ring: Mutex::new(ByteRingBuffer::new(capacity)),
            data_available: Condvar::new(),
            closed: AtomicBool::new(false),
            close_policy,
            recheck_interval: recheck_interval.max(MIN_RECHECK_INTERVAL),
        }
    }

    /// The ring holds only plain indices, so a panic while holding the lock can't leave
    /// it half updated. Recover the guard instead of propagating the poison.
    fn lock_ring(&self) -> MutexGuard<'_, ByteRingBuffer> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn capacity(&self) -> usize { self.lock_ring().capacity() }

    #[must_use]
    pub fn len(&self) -> usize { self.lock_ring().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock_ring().is_empty() }

    #[must_use]
    pub fn recheck_interval(&self) -> Duration { self.recheck_interval }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }

    /// Producer side. Never blocks on a full buffer; see [`PushOutcome`].
    pub fn push(&self, byte: u8) -> PushOutcome {
        if self.is_closed() {
            return PushOutcome::DroppedClosed;
        }
        let stored = self.lock_ring().push(byte);
        if stored {
            self.data_available.notify_one();
            PushOutcome::Stored
        } else {
            PushOutcome::DroppedFull
        }
    }

    /// Consumer side. See [`ReadMode`] and [`ClosePolicy`].
    ///
    /// # Errors
    ///
    /// - [`PopError::Empty`] for a non-blocking read with nothing buffered.
    /// - [`PopError::TimedOut`] when a blocking read's timeout elapses.
    /// - [`PopError::Closed`] once the channel is closed (subject to [`ClosePolicy`]).
    ///
    /// A timeout too large to be represented as an [`Instant`] waits with no deadline.
    pub fn pop(&self, mode: ReadMode) -> Result<u8, PopError> {
        let deadline = match mode {
            ReadMode::Blocking {
                timeout: Some(timeout),
            } => Instant::now().checked_add(timeout),
            ReadMode::Blocking { timeout: None } | ReadMode::NonBlocking => None,
        };

        let mut ring = self.lock_ring();
        loop {
            if self.is_closed()
                && (self.close_policy == ClosePolicy::CloseImmediately || ring.is_empty())
            {
                return Err(PopError::Closed);
            }

            if let Some(byte) = ring.pop() {
                return Ok(byte);
            }

            let wait_for = match (mode, deadline) {
                (ReadMode::NonBlocking, _) => return Err(PopError::Empty),
                (ReadMode::Blocking { .. }, None) => self.recheck_interval,
                (ReadMode::Blocking { .. }, Some(deadline)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PopError::TimedOut);
                    }
                    (deadline - now).min(self.recheck_interval)
                }
            };

            ring = match self.data_available.wait_timeout(ring, wait_for) {
                Ok((guard, _timeout_result)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Closes the channel and wakes every blocked consumer. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ring = self.lock_ring();
        self.data_available.notify_all();
    }

    /// Sets the closed flag without locking or notifying. For contexts that must not
    /// take the channel's lock. Blocked consumers observe it within one recheck
    /// interval.
    pub fn mark_closed_lock_free(&self) { self.closed.store(true, Ordering::SeqCst); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, thread};

    const RECHECK: Duration = Duration::from_millis(20);

    fn new_channel(capacity: usize, close_policy: ClosePolicy) -> Arc<BoundedByteChannel> {
        Arc::new(BoundedByteChannel::new(capacity, close_policy, RECHECK))
    }

    #[test]
    fn test_fifo_when_consumer_is_not_reading() {
        let channel = new_channel(16, ClosePolicy::default());
        for byte in b"abc" {
            assert_eq!(channel.push(*byte), PushOutcome::Stored);
        }
        let popped: Vec<u8> = (0..3)
            .map(|_| channel.pop(ReadMode::NonBlocking).unwrap())
            .collect();
        assert_eq!(popped, b"abc".to_vec());
    }

    #[test]
    fn test_push_on_full_drops_newest() {
        let channel = new_channel(4, ClosePolicy::default());
        let outcomes: Vec<PushOutcome> = b"ABCDE".iter().map(|it| channel.push(*it)).collect();
        assert_eq!(outcomes[4], PushOutcome::DroppedFull);
        assert_eq!(channel.len(), 4);
        for expected in b"ABCD" {
            assert_eq!(channel.pop(ReadMode::NonBlocking), Ok(*expected));
        }
        assert_eq!(channel.pop(ReadMode::NonBlocking), Err(PopError::Empty));
    }

    #[test]
    fn test_non_blocking_pop_on_empty_returns_immediately() {
        let channel = new_channel(4, ClosePolicy::default());
        let start = Instant::now();
        assert_eq!(channel.pop(ReadMode::NonBlocking), Err(PopError::Empty));
        assert!(start.elapsed() < RECHECK);
    }

    #[test]
    fn test_blocking_pop_times_out() {
        let channel = new_channel(4, ClosePolicy::default());
        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        assert_eq!(
            channel.pop(ReadMode::blocking_with_timeout(timeout)),
            Err(PopError::TimedOut)
        );
        assert!(start.elapsed() >= timeout);
    }

    /// After filling to capacity and draining, a blocking pop must wait rather than
    /// return a stale byte.
    #[test]
    fn test_blocking_pop_waits_after_fill_and_drain() {
        let channel = new_channel(4, ClosePolicy::default());
        for byte in b"ABCD" {
            channel.push(*byte);
        }
        for _ in 0..4 {
            channel.pop(ReadMode::NonBlocking).unwrap();
        }
        assert_eq!(
            channel.pop(ReadMode::blocking_with_timeout(Duration::from_millis(30))),
            Err(PopError::TimedOut)
        );
    }

    #[test]
    fn test_blocking_pop_is_woken_by_push() {
        let channel = new_channel(4, ClosePolicy::default());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.pop(ReadMode::blocking_with_timeout(Duration::from_secs(5))))
        };
        thread::sleep(Duration::from_millis(30));
        channel.push(b'x');
        assert_eq!(consumer.join().unwrap(), Ok(b'x'));
    }

    #[test]
    fn test_close_wakes_all_blocked_consumers() {
        let channel = new_channel(4, ClosePolicy::default());
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    let start = Instant::now();
                    let result = channel.pop(ReadMode::blocking_forever());
                    (result, start.elapsed())
                })
            })
            .collect();
        thread::sleep(Duration::from_millis(30));
        channel.close();
        for consumer in consumers {
            let (result, elapsed) = consumer.join().unwrap();
            assert_eq!(result, Err(PopError::Closed));
            assert!(elapsed < Duration::from_secs(2));
        }
    }

    #[test]
    fn test_lock_free_close_is_observed_within_recheck_interval() {
        let channel = new_channel(4, ClosePolicy::default());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.pop(ReadMode::blocking_forever()))
        };
        thread::sleep(Duration::from_millis(30));
        channel.mark_closed_lock_free();
        assert_eq!(consumer.join().unwrap(), Err(PopError::Closed));
    }

    #[test]
    fn test_lock_free_close_wakes_finite_timeout_pop_within_recheck_interval() {
        let channel = new_channel(4, ClosePolicy::default());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let start = Instant::now();
                let result = channel.pop(ReadMode::blocking_with_timeout(Duration::from_secs(10)));
                (result, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(30));
        let closed_at = Instant::now();
        channel.mark_closed_lock_free();
        let (result, elapsed) = consumer.join().unwrap();
        assert_eq!(result, Err(PopError::Closed));
        assert!(elapsed < Duration::from_secs(2));
        assert!(closed_at.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_huge_timeout_waits_without_deadline() {
        let channel = new_channel(4, ClosePolicy::default());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.pop(ReadMode::blocking_with_timeout(Duration::MAX)))
        };
        thread::sleep(Duration::from_millis(30));
        channel.push(b'm');
        assert_eq!(consumer.join().unwrap(), Ok(b'm'));

        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.pop(ReadMode::blocking_with_timeout(Duration::MAX)))
        };
        thread::sleep(Duration::from_millis(30));
        channel.close();
        assert_eq!(consumer.join().unwrap(), Err(PopError::Closed));
    }

    #[test]
    fn test_zero_recheck_interval_is_clamped() {
        let channel = BoundedByteChannel::new(4, ClosePolicy::default(), Duration::ZERO);
        assert_eq!(channel.recheck_interval(), MIN_RECHECK_INTERVAL);

        let channel = Arc::new(channel);
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.pop(ReadMode::blocking_forever()))
        };
        thread::sleep(Duration::from_millis(30));
        channel.mark_closed_lock_free();
        assert_eq!(consumer.join().unwrap(), Err(PopError::Closed));
    }

    #[test]
    fn test_drain_then_close_delivers_buffered_bytes() {
        let channel = new_channel(4, ClosePolicy::DrainThenClose);
        channel.push(b'h');
        channel.push(b'i');
        channel.close();
        assert_eq!(channel.pop(ReadMode::NonBlocking), Ok(b'h'));
        assert_eq!(channel.pop(ReadMode::blocking_forever()), Ok(b'i'));
        assert_eq!(channel.pop(ReadMode::blocking_forever()), Err(PopError::Closed));
        assert_eq!(channel.pop(ReadMode::NonBlocking), Err(PopError::Closed));
    }

    #[test]
    fn test_close_immediately_discards_buffered_bytes() {
        let channel = new_channel(4, ClosePolicy::CloseImmediately);
        channel.push(b'h');
        channel.close();
        assert_eq!(channel.pop(ReadMode::NonBlocking), Err(PopError::Closed));
        assert_eq!(channel.pop(ReadMode::blocking_forever()), Err(PopError::Closed));
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let channel = new_channel(4, ClosePolicy::default());
        channel.close();
        assert_eq!(channel.push(b'z'), PushOutcome::DroppedClosed);
        assert!(channel.is_empty());
    }

    /// One producer retrying on [`PushOutcome::DroppedFull`] and one blocking consumer:
    /// every byte arrives exactly once, in order, through a small buffer that wraps
    /// many times.
    #[test]
    fn test_concurrent_producer_consumer_preserves_order() {
        const TOTAL: usize = 20_000;
        let channel = new_channel(8, ClosePolicy::default());

        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for index in 0..TOTAL {
                    #[allow(clippy::cast_possible_truncation)]
                    let byte = (index % 256) as u8;
                    while channel.push(byte) == PushOutcome::DroppedFull {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut received = Vec::with_capacity(TOTAL);
        while received.len() < TOTAL {
            match channel.pop(ReadMode::blocking_with_timeout(Duration::from_secs(5))) {
                Ok(byte) => received.push(byte),
                Err(error) => panic!("unexpected pop error: {error:?}"),
            }
        }
        producer.join().unwrap();

        #[allow(clippy::cast_possible_truncation)]
        let expected: Vec<u8> = (0..TOTAL).map(|index| (index % 256) as u8).collect();
        assert_eq!(received, expected);
    }
}
