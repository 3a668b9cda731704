//! Frame publisher: drains receive events into framework replies.
//!
//! Runs in task context, downstream of the lock-free queue. Each
//! completed frame becomes a `Received` reply carrying the bytes; each
//! overflow becomes an `ErrOverflow` status. This is the only place the
//! receive path logs.

use core::fmt::Write;

use heapless::String;
use log::{info, warn};

use crate::frame::{ReplyCode, ReplyFrame, FRAME_DATA_MAX};
use crate::hal::EventSink;
use crate::rx::{RxEventKind, RxEventQueue, RX_BUF_SIZE, RX_QUEUE_DEPTH};

// A whole receive buffer must fit behind the two-byte reply header.
const _: () = assert!(RX_BUF_SIZE + 2 <= FRAME_DATA_MAX);

/// Publishes completed receive frames to the framework.
///
/// [`service`](Self::service) is one pass of the publisher task's loop
/// body; the task parks between passes and wakes on queue activity or a
/// periodic tick. If the platform cannot allocate the task at startup the
/// module stays disabled: received frames would pile into the queue and
/// drop.
pub struct FramePublisher<'a, const N: usize = RX_QUEUE_DEPTH> {
    queue: &'a RxEventQueue<N>,
    module_id: u8,
}

impl<'a, const N: usize> FramePublisher<'a, N> {
    pub const fn new(queue: &'a RxEventQueue<N>, module_id: u8) -> Self {
        Self { queue, module_id }
    }

    /// Drain every pending event into `sink`.
    ///
    /// Returns the number of events published.
    pub fn service(&mut self, sink: &mut dyn EventSink) -> usize {
        let mut published = 0;

        while let Some(event) = self.queue.pop() {
            let reply = match event.kind {
                RxEventKind::Frame => {
                    info!("received 0x{}", hex_string(event.bytes()));
                    ReplyFrame::with_payload(self.module_id, ReplyCode::Received, event.bytes())
                }
                RxEventKind::Overflow => {
                    warn!("rx buffer overflow, bytes discarded");
                    ReplyFrame::status(self.module_id, ReplyCode::ErrOverflow)
                }
            };

            sink.publish(&reply);
            published += 1;
        }

        let dropped = self.queue.dropped();
        if dropped > 0 {
            warn!("{} rx events dropped, publisher falling behind", dropped);
            self.queue.reset_dropped();
        }

        published
    }
}

/// Hex-encode up to a full receive buffer for diagnostics.
fn hex_string(bytes: &[u8]) -> String<{ RX_BUF_SIZE * 2 }> {
    let mut s = String::new();
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}
