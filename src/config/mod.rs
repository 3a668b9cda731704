//! UART line configuration.
//!
//! [`PortConfig`] carries the live line parameters (baud rate, data bits,
//! parity, stop bits). [`UartConfig`] wraps them together with the module's
//! persistence state and target device index; the byte-level record codec
//! lives in [`store`].
//!
//! Line parameters travel over the wire as a mode string such as
//! `115200-8N1` (`<baud>-<data bits><parity letter><stop bits>`), parsed by
//! [`parse_mode`] and rendered by [`PortConfig::mode_string`].

pub mod store;

use core::fmt;

use heapless::String;

/// Default UART device index driven by the module.
pub const DEFAULT_UART_DEV: u8 = 1;

/// Number of UART devices the target board wires up. Persisted records
/// addressing a device at or above this index are rejected on load.
pub const UART_DEV_COUNT: u8 = 3;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    /// Eight data bits, no parity framing.
    Eight,
    /// Nine-bit framing: eight data bits plus one parity bit.
    Nine,
}

impl DataBits {
    /// Decode the persisted record byte.
    pub fn from_record(raw: u8) -> Option<Self> {
        match raw {
            8 => Some(DataBits::Eight),
            9 => Some(DataBits::Nine),
            _ => None,
        }
    }

    /// Encode for the persisted record.
    pub fn record_value(self) -> u8 {
        match self {
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }

    /// Data payload bits carried per character. The ninth bit of
    /// [`DataBits::Nine`] is parity, so both framings carry eight.
    pub fn payload_bits(self) -> u8 {
        8
    }
}

/// Parity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    /// Decode the persisted record byte.
    pub fn from_record(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Parity::None),
            1 => Some(Parity::Odd),
            2 => Some(Parity::Even),
            _ => None,
        }
    }

    /// Encode for the persisted record.
    pub fn record_value(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
        }
    }

    /// Mode string letter: `N`, `O` or `E`.
    pub fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Decode the persisted record byte.
    pub fn from_record(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(StopBits::One),
            2 => Some(StopBits::Two),
            _ => None,
        }
    }

    /// Encode for the persisted record.
    pub fn record_value(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// UART line parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub baudrate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for PortConfig {
    /// 115200-8N1.
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl PortConfig {
    /// Render as a mode string, e.g. `115200-8N1`.
    ///
    /// Nine-bit framing renders its payload width (`8`), matching what the
    /// wire actually carries.
    pub fn mode_string(&self) -> String<16> {
        use core::fmt::Write;

        let mut s = String::new();
        let _ = write!(
            s,
            "{}-{}{}{}",
            self.baudrate,
            self.data_bits.payload_bits(),
            self.parity.letter(),
            self.stop_bits.record_value()
        );
        s
    }
}

/// Mode string parse/validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeError {
    /// String does not match `<baud>-<bits><parity><stop>`.
    Syntax,
    /// Data bits out of range (only 8 is supported).
    DataBits,
    /// Parity letter out of range.
    Parity,
    /// Stop bits out of range.
    StopBits,
}

impl ModeError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Syntax => "error parsing parameters string",
            Self::DataBits => "invalid number of data bits, must be 8",
            Self::Parity => "invalid parity value, must be N, O or E",
            Self::StopBits => "invalid number of stop bits, must be 1 or 2",
        }
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Parse a mode string like `115200-8N1` into line parameters.
///
/// `E` and `O` parity switch the framing to [`DataBits::Nine`]: the parity
/// bit occupies a ninth bit slot on the wire.
pub fn parse_mode(s: &str) -> Result<PortConfig, ModeError> {
    let (baud_part, rest) = s.split_once('-').ok_or(ModeError::Syntax)?;
    let baudrate: u32 = baud_part.parse().map_err(|_| ModeError::Syntax)?;

    let bits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if bits_len == 0 {
        return Err(ModeError::Syntax);
    }
    let (bits_part, rest) = rest.split_at(bits_len);

    let mut chars = rest.chars();
    let parity_ch = chars.next().ok_or(ModeError::Syntax)?;
    let stop_part = chars.as_str();
    let stop_len = stop_part.bytes().take_while(u8::is_ascii_digit).count();
    if stop_len == 0 {
        return Err(ModeError::Syntax);
    }

    if bits_part.parse::<u32>().map_err(|_| ModeError::DataBits)? != 8 {
        return Err(ModeError::DataBits);
    }

    let (parity, data_bits) = match parity_ch {
        'N' => (Parity::None, DataBits::Eight),
        'E' => (Parity::Even, DataBits::Nine),
        'O' => (Parity::Odd, DataBits::Nine),
        _ => return Err(ModeError::Parity),
    };

    let stop_bits = match stop_part[..stop_len]
        .parse::<u32>()
        .map_err(|_| ModeError::StopBits)?
    {
        1 => StopBits::One,
        2 => StopBits::Two,
        _ => return Err(ModeError::StopBits),
    };

    Ok(PortConfig {
        baudrate,
        data_bits,
        parity,
        stop_bits,
    })
}

/// Persisted module configuration.
///
/// `valid` is false in the reset state and becomes true once a record has
/// been persisted (or loaded back from the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub valid: bool,
    pub uart_dev: u8,
    pub port: PortConfig,
}

impl Default for UartConfig {
    /// Reset state: not persisted, default device, 115200-8N1.
    fn default() -> Self {
        Self {
            valid: false,
            uart_dev: DEFAULT_UART_DEV,
            port: PortConfig::default(),
        }
    }
}
