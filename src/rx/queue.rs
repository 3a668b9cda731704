//! Event queue between the receive side and the publisher task.
//!
//! ```text
//! interrupt/timer ctx      RxEventQueue         publisher task
//! ───────────────────      ────────────         ──────────────
//! on_byte / poll ───────▶ [E0][E1][E2] ───────▶ service()
//! bounded work             lock-free            blocking ok
//! never blocks             ring buffer
//! ```
//!
//! Completed frames travel by value: each event carries its own copy of
//! the received bytes, so the consumer never reaches back into the live
//! receive buffer. A push onto a full ring drops the event and counts it.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use super::RX_BUF_SIZE;

/// Default queue depth. Frames complete at idle-timeout granularity, so a
/// shallow ring absorbs publisher latency.
pub const RX_QUEUE_DEPTH: usize = 4;

/// What a queued event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RxEventKind {
    /// A completed frame; bytes are in the event.
    Frame = 0,
    /// The receive buffer overflowed and its contents were discarded.
    Overflow = 1,
}

/// A receive event, frame bytes included.
#[derive(Clone, Copy)]
pub struct RxEvent {
    pub kind: RxEventKind,
    pub len: u8,
    pub data: [u8; RX_BUF_SIZE],
}

impl RxEvent {
    /// Overflow marker event.
    pub const OVERFLOW: Self = Self {
        kind: RxEventKind::Overflow,
        len: 0,
        data: [0; RX_BUF_SIZE],
    };

    const EMPTY: Self = Self {
        kind: RxEventKind::Frame,
        len: 0,
        data: [0; RX_BUF_SIZE],
    };

    /// Build a frame event from a byte snapshot.
    pub fn frame(bytes: &[u8]) -> Self {
        let mut event = Self::EMPTY;
        let n = bytes.len().min(RX_BUF_SIZE);
        event.data[..n].copy_from_slice(&bytes[..n]);
        event.len = n as u8;
        event
    }

    /// The frame bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Lock-free SPSC ring carrying receive events.
///
/// Producer is the receive side (interrupt and timer contexts, serialized
/// by the accumulator's critical section); consumer is the publisher
/// task.
pub struct RxEventQueue<const N: usize = RX_QUEUE_DEPTH> {
    slots: UnsafeCell<[RxEvent; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Single producer (serialized by the accumulator's critical
// section), single consumer, coordination through the atomic indices.
unsafe impl<const N: usize> Sync for RxEventQueue<N> {}
unsafe impl<const N: usize> Send for RxEventQueue<N> {}

impl<const N: usize> RxEventQueue<N> {
    const MASK: usize = N - 1;

    /// Create a new empty queue.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Queue depth must be power of 2");

        Self {
            slots: UnsafeCell::new([RxEvent::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event (interrupt-safe, never blocks).
    ///
    /// Returns `true` if queued, `false` if dropped (ring full).
    #[inline]
    pub fn push(&self, event: &RxEvent) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: Single producer; the consumer never reads a slot until
        // the Release store below publishes it.
        unsafe {
            (*self.slots.get())[(write as usize) & Self::MASK] = *event;
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Pop the next event (for the publisher task).
    ///
    /// Returns `None` if no events are pending.
    #[inline]
    pub fn pop(&self) -> Option<RxEvent> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Single consumer; the slot was published by the producer's
        // Release store on write_idx.
        let event = unsafe { (*self.slots.get())[(read as usize) & Self::MASK] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(event)
    }

    /// Check if there are events to drain.
    #[inline]
    pub fn has_events(&self) -> bool {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        read != write
    }

    /// Number of events waiting.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Count of events dropped against a full ring.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the dropped counter (e.g. after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for RxEventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
