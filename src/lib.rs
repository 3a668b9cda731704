//! # uart-bridge
//!
//! Half-duplex UART bridge module: forwards command payloads to the
//! wire, frames inbound bytes on idle gaps, and manages persisted line
//! configuration.
//!
//! ## Architecture
//!
//! ```text
//! commands ──▶ UartBridge ──▶ UART TX (RE/DE pulsed high around writes)
//! shell    ──▶     │
//!                  ▼
//!             ConfigStore
//!
//! UART RX irq ──▶ RxAccumulator ──▶ RxEventQueue ──▶ FramePublisher ──▶ EventSink
//!                 (idle timeout)     (lock-free)      (task context)
//! ```
//!
//! The receive path splits across contexts: the interrupt side appends
//! bytes and arms the idle deadline, the timer side snapshots completed
//! frames into the queue, and the publisher task turns them into framework
//! replies. Hardware stays behind the traits in [`hal`].

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;
pub mod frame;
pub mod hal;
pub mod publisher;
pub mod rx;

pub use bridge::{UartBridge, SHELL_COMMAND};
pub use config::{DataBits, Parity, PortConfig, StopBits, UartConfig};
pub use frame::{CommandCode, CommandFrame, ReplyCode, ReplyFrame};
pub use hal::{ConfigStore, EventSink, HalfDuplexPins, UartPort};
pub use publisher::FramePublisher;
pub use rx::{RxAccumulator, RxEvent, RxEventKind, RxEventQueue};
