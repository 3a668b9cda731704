//! Hardware seams for the platform to implement.
//!
//! The module never touches registers; it drives the UART, transceiver
//! pins, config store and publish path through these interfaces. The
//! platform wires its receive interrupt and one-shot timer into
//! [`RxAccumulator`](crate::rx::RxAccumulator) when it brings a port up.

use embedded_hal::digital::OutputPin;

use crate::config::PortConfig;
use crate::frame::ReplyFrame;

pub use crate::config::store::ConfigStore;

/// A configurable UART port.
///
/// Implementations deliver received bytes, one at a time with a
/// microsecond timestamp, to `RxAccumulator::on_byte`, and call
/// `RxAccumulator::poll` when the deadline it returns expires.
pub trait UartPort {
    /// Configuration failure (unsupported baud rate, dead peripheral).
    type Error: core::fmt::Debug;

    /// Apply line parameters and (re)start the receiver.
    ///
    /// Synchronous with no timeout; a wedged peripheral blocks the
    /// caller.
    fn configure(&mut self, config: &PortConfig) -> Result<(), Self::Error>;

    /// Write bytes to the wire, running to completion.
    fn write(&mut self, bytes: &[u8]);
}

/// Outbound publish boundary toward the framework.
pub trait EventSink {
    fn publish(&mut self, frame: &ReplyFrame);
}

/// Direction pins of a half-duplex transceiver.
///
/// `re` is receive-enable, `de` is drive-enable. Both idle low
/// (listening) and go high for the duration of a write. Pin errors are
/// ignored: the lines are plain push-pull outputs.
pub struct HalfDuplexPins<RE, DE> {
    re: RE,
    de: DE,
}

impl<RE: OutputPin, DE: OutputPin> HalfDuplexPins<RE, DE> {
    pub fn new(re: RE, de: DE) -> Self {
        Self { re, de }
    }

    /// Raise both lines for transmission, receive-enable first.
    pub fn enter_transmit(&mut self) {
        let _ = self.re.set_high();
        let _ = self.de.set_high();
    }

    /// Drop both lines back to listening, same order.
    pub fn enter_receive(&mut self) {
        let _ = self.re.set_low();
        let _ = self.de.set_low();
    }
}
