//! Receive accumulator: interrupt-fed byte buffer with idle-timeout
//! framing.
//!
//! ```text
//!   byte interrupt                     one-shot timer
//!        │                                   │
//!        ▼                                   ▼
//!  on_byte(now, b)                       poll(now)
//!  append + arm deadline          snapshot + clear on expiry
//!        │                                   │
//!        └────────────▶ RxEventQueue ◀───────┘
//! ```
//!
//! A frame is whatever arrived between idle gaps: every byte re-arms the
//! flush deadline, and the frame completes once the deadline passes with
//! no new bytes. State lives behind a critical section, so the snapshot
//! taken in [`RxAccumulator::poll`] is atomic with respect to concurrent
//! appends and the published bytes are always a consistent copy.

pub mod queue;

pub use queue::{RxEvent, RxEventKind, RxEventQueue, RX_QUEUE_DEPTH};

use core::cell::RefCell;

use critical_section::Mutex;

/// Receive buffer capacity in bytes.
pub const RX_BUF_SIZE: usize = 128;

/// Default idle gap that completes a frame, in microseconds.
pub const DEFAULT_IDLE_TIMEOUT_US: i64 = 50_000;

struct RxState {
    buf: [u8; RX_BUF_SIZE],
    len: usize,
    /// Armed flush deadline. `Some` exactly while `len > 0`.
    deadline_us: Option<i64>,
}

/// Accumulates received bytes into frames separated by idle gaps.
///
/// The platform feeds [`on_byte`](Self::on_byte) from its receive
/// interrupt and drives [`poll`](Self::poll) from a one-shot timer armed
/// at the deadline `on_byte` returns. Re-arming replaces any pending
/// expiry; a stale expiry that fires anyway is absorbed by `poll`.
///
/// # Example
///
/// ```ignore
/// static RX_QUEUE: RxEventQueue = RxEventQueue::new();
/// static RX: RxAccumulator = RxAccumulator::new(&RX_QUEUE);
///
/// // interrupt handler
/// if let Some(deadline) = RX.on_byte(now_us, byte) {
///     timer.arm_one_shot(deadline);
/// }
///
/// // timer expiry
/// RX.poll(now_us);
/// ```
pub struct RxAccumulator<'a, const N: usize = RX_QUEUE_DEPTH> {
    queue: &'a RxEventQueue<N>,
    state: Mutex<RefCell<RxState>>,
    idle_timeout_us: i64,
}

impl<'a, const N: usize> RxAccumulator<'a, N> {
    /// Create an accumulator with the default idle timeout.
    pub const fn new(queue: &'a RxEventQueue<N>) -> Self {
        Self::with_timeout(queue, DEFAULT_IDLE_TIMEOUT_US)
    }

    /// Create an accumulator with a specific idle timeout.
    pub const fn with_timeout(queue: &'a RxEventQueue<N>, idle_timeout_us: i64) -> Self {
        Self {
            queue,
            state: Mutex::new(RefCell::new(RxState {
                buf: [0; RX_BUF_SIZE],
                len: 0,
                deadline_us: None,
            })),
            idle_timeout_us,
        }
    }

    /// Feed one received byte from the interrupt handler.
    ///
    /// Returns the refreshed flush deadline for the platform's one-shot
    /// timer, or `None` when the byte overflowed the buffer.
    ///
    /// Bounded work, no logging: safe to call in interrupt context.
    #[inline]
    pub fn on_byte(&self, now_us: i64, byte: u8) -> Option<i64> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();

            if state.len == RX_BUF_SIZE {
                // Full: discard everything, this byte included, and tell
                // the publisher. The deadline dies with the buffer.
                state.len = 0;
                state.deadline_us = None;
                self.queue.push(&RxEvent::OVERFLOW);
                return None;
            }

            let at = state.len;
            state.buf[at] = byte;
            state.len = at + 1;

            let deadline = now_us + self.idle_timeout_us;
            state.deadline_us = Some(deadline);
            Some(deadline)
        })
    }

    /// Drive the idle timeout from the platform timer.
    ///
    /// Once the armed deadline has passed, the buffered bytes are
    /// snapshotted into the queue and the buffer resets, all inside one
    /// critical section. Returns `true` when a frame was flushed.
    pub fn poll(&self, now_us: i64) -> bool {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();

            let due = match state.deadline_us {
                Some(deadline) => now_us >= deadline,
                None => false,
            };
            if !due {
                return false;
            }

            let event = RxEvent::frame(&state.buf[..state.len]);
            state.len = 0;
            state.deadline_us = None;

            self.queue.push(&event);
            true
        })
    }

    /// The armed flush deadline, if any.
    pub fn next_deadline_us(&self) -> Option<i64> {
        critical_section::with(|cs| self.state.borrow(cs).borrow().deadline_us)
    }

    /// Bytes currently buffered.
    pub fn pending_len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow(cs).borrow().len)
    }

    /// The configured idle gap in microseconds.
    pub fn idle_timeout_us(&self) -> i64 {
        self.idle_timeout_us
    }
}
