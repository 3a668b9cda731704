//! Persisted configuration records.
//!
//! The module keeps one fixed-size record in the platform's key-value
//! store, addressed by module id:
//!
//! ```text
//! offset  size  field
//! ──────  ────  ─────
//! 0       1     validity marker (0x00 blank / 0xFF erased / else persisted)
//! 1       1     UART device index
//! 2       4     baud rate, little-endian
//! 6       1     data bits (8 or 9)
//! 7       1     parity (0 none, 1 odd, 2 even)
//! 8       1     stop bits (1 or 2)
//! ```
//!
//! A record that fails any field check loads as the built-in defaults.
//! A stop-bits byte above the legal maximum is the usual signature of a
//! record written by an incompatible older layout. The module never
//! refuses to start over a bad record.

use log::warn;

use super::{DataBits, Parity, PortConfig, StopBits, UartConfig, UART_DEV_COUNT};

/// Size of the persisted record in bytes.
pub const RECORD_LEN: usize = 9;

/// Marker byte stamped on records by [`save_config`].
const MARKER_PERSISTED: u8 = 0x01;

/// Platform key-value store holding per-module configuration records.
///
/// Failures are soft at this boundary: a load miss falls back to defaults
/// and a save refusal is logged and dropped.
pub trait ConfigStore {
    /// Read the record for `module_id` into `buf`, returning the number of
    /// bytes read, or `None` when the store holds nothing for this module.
    fn load(&mut self, module_id: u8, buf: &mut [u8]) -> Option<usize>;

    /// Write the record for `module_id`. Returns `false` if the store
    /// refused the write.
    fn save(&mut self, module_id: u8, data: &[u8]) -> bool;
}

/// Decode a persisted record, validating every field.
///
/// Returns `None` for short records, not-persisted markers and any field
/// outside its enumerated range; the caller substitutes defaults.
pub fn decode_record(buf: &[u8]) -> Option<UartConfig> {
    if buf.len() < RECORD_LEN {
        return None;
    }
    // 0x00 was never written, 0xFF is erased flash
    if buf[0] == 0x00 || buf[0] == 0xFF {
        return None;
    }

    let uart_dev = buf[1];
    if uart_dev >= UART_DEV_COUNT {
        return None;
    }

    let baudrate = u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]);
    let data_bits = DataBits::from_record(buf[6])?;
    let parity = Parity::from_record(buf[7])?;
    let stop_bits = StopBits::from_record(buf[8])?;

    Some(UartConfig {
        valid: true,
        uart_dev,
        port: PortConfig {
            baudrate,
            data_bits,
            parity,
            stop_bits,
        },
    })
}

/// Encode a configuration into record form.
pub fn encode_record(config: &UartConfig) -> [u8; RECORD_LEN] {
    let mut buf = [0u8; RECORD_LEN];
    buf[0] = if config.valid { MARKER_PERSISTED } else { 0x00 };
    buf[1] = config.uart_dev;
    buf[2..6].copy_from_slice(&config.port.baudrate.to_le_bytes());
    buf[6] = config.port.data_bits.record_value();
    buf[7] = config.port.parity.record_value();
    buf[8] = config.port.stop_bits.record_value();
    buf
}

/// Load the module configuration, falling back to defaults when the store
/// has no usable record.
pub fn load_config<S: ConfigStore>(store: &mut S, module_id: u8) -> UartConfig {
    let mut buf = [0u8; RECORD_LEN];
    match store.load(module_id, &mut buf) {
        Some(n) => decode_record(&buf[..n.min(RECORD_LEN)]).unwrap_or_default(),
        None => UartConfig::default(),
    }
}

/// Persist the configuration, stamping it valid.
pub fn save_config<S: ConfigStore>(store: &mut S, module_id: u8, config: &mut UartConfig) {
    config.valid = true;
    if !store.save(module_id, &encode_record(config)) {
        warn!("config save rejected by store");
    }
}
