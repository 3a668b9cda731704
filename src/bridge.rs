//! The bridge module instance: command dispatch, shell handling, line
//! management.
//!
//! One [`UartBridge`] owns the persisted configuration, the port and the
//! transceiver direction pins. Framework commands arrive through
//! [`handle_command`](UartBridge::handle_command) and always produce a
//! reply; the local console reaches the same line through
//! [`shell`](UartBridge::shell). Callers serialize both entry points.

use core::fmt::Write;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::store::{load_config, save_config, ConfigStore};
use crate::config::{parse_mode, ModeError, PortConfig, UartConfig};
use crate::frame::{CommandCode, CommandFrame, ReplyCode, ReplyFrame};
use crate::hal::{HalfDuplexPins, UartPort};

/// Shell command name for registry registration.
pub const SHELL_COMMAND: &str = "uart";

/// Most data bytes a shell `send` accepts (two hex digits per byte).
pub const SHELL_SEND_MAX: usize = 200;

/// Shortest valid SetParameters frame: code byte plus a mode string.
const SET_PARAMETERS_MIN_LEN: usize = 8;

/// A UART bridge module instance.
pub struct UartBridge<U, RE, DE, S> {
    module_id: u8,
    config: UartConfig,
    port: U,
    pins: HalfDuplexPins<RE, DE>,
    store: S,
}

impl<U, RE, DE, S> UartBridge<U, RE, DE, S>
where
    U: UartPort,
    RE: OutputPin,
    DE: OutputPin,
    S: ConfigStore,
{
    /// Create a module instance with default configuration.
    ///
    /// Call [`init`](Self::init) before dispatching anything.
    pub fn new(module_id: u8, port: U, pins: HalfDuplexPins<RE, DE>, store: S) -> Self {
        Self {
            module_id,
            config: UartConfig::default(),
            port,
            pins,
            store,
        }
    }

    /// Load persisted configuration and bring the line up.
    ///
    /// On `Err` the module must stay disabled: skip publisher spawn and
    /// shell registration, the receive path is dead.
    pub fn init(&mut self) -> Result<(), U::Error> {
        self.config = load_config(&mut self.store, self.module_id);

        info!("mode: {}", self.config.port.mode_string());

        if let Err(e) = self.port.configure(&self.config.port) {
            warn!("uart init failed: {:?}", e);
            return Err(e);
        }

        self.pins.enter_receive();
        Ok(())
    }

    /// Active configuration.
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Module id stamped on replies.
    pub fn module_id(&self) -> u8 {
        self.module_id
    }

    /// Handle one framework command, always producing a reply.
    pub fn handle_command(&mut self, command: CommandFrame<'_>) -> ReplyFrame {
        let code = match command.code() {
            Some(code) => code,
            None => {
                warn!("no command received");
                return self.status(ReplyCode::ErrFormat);
            }
        };

        match CommandCode::from_u8(code) {
            Some(CommandCode::SendAll) => self.cmd_send_all(&command),
            Some(CommandCode::SetParameters) => self.cmd_set_parameters(&command),
            None => self.status(ReplyCode::ErrFormat),
        }
    }

    /// Forward the command data to the wire verbatim.
    fn cmd_send_all(&mut self, command: &CommandFrame<'_>) -> ReplyFrame {
        let data = command.data();
        if data.is_empty() {
            // Cannot send nothing
            warn!("incorrect data length: {}", command.len());
            return self.status(ReplyCode::ErrFormat);
        }

        self.transmit(data);
        self.status(ReplyCode::Sent)
    }

    /// Reconfigure the line from a mode string payload.
    fn cmd_set_parameters(&mut self, command: &CommandFrame<'_>) -> ReplyFrame {
        if command.len() < SET_PARAMETERS_MIN_LEN {
            warn!(
                "incorrect data length: {}, should be >= {}",
                command.len(),
                SET_PARAMETERS_MIN_LEN
            );
            return self.status(ReplyCode::ErrFormat);
        }

        let text = mode_text(command.data());
        let params = match parse_mode(text) {
            Ok(params) => params,
            Err(ModeError::Syntax) => {
                warn!("error parsing parameters string: {}", text);
                return self.status(ReplyCode::ErrFormat);
            }
            Err(e) => {
                warn!("{}", e);
                return self.status(ReplyCode::ErrFormat);
            }
        };

        if let Err(e) = self.port.configure(&params) {
            warn!("baud rate not supported: {:?}", e);
            return self.status(ReplyCode::ErrUart);
        }

        self.config.port = params;
        info!("mode: {}", self.config.port.mode_string());
        save_config(&mut self.store, self.module_id, &mut self.config);

        self.status(ReplyCode::BaudrateSet)
    }

    /// Handle the module's shell command line.
    ///
    /// `args` excludes the command name itself; an empty list prints
    /// usage. Unknown subcommands are a silent no-op.
    pub fn shell(&mut self, args: &[&str], out: &mut dyn Write) {
        let cmd = match args.first() {
            Some(cmd) => *cmd,
            None => {
                self.print_usage(out);
                return;
            }
        };

        match cmd {
            "send" => self.shell_send(args.get(1).copied(), out),
            "baud" => self.shell_baud(args.get(1).copied()),
            "reset" => self.shell_reset(),
            _ => {}
        }
    }

    fn print_usage(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "{} send <hex> - send data to UART port", SHELL_COMMAND);
        let _ = writeln!(out, "{} baud <baud> - set baudrate", SHELL_COMMAND);
        let _ = writeln!(out, "{} reset - reset settings to default", SHELL_COMMAND);
    }

    /// `send <hex>`: decode hex pairs and push them out the wire.
    fn shell_send(&mut self, arg: Option<&str>, out: &mut dyn Write) {
        let hex = match arg {
            Some(hex) => hex,
            None => {
                let _ = writeln!(out, "{} send <hex> - send data to UART port", SHELL_COMMAND);
                return;
            }
        };

        if hex.len() % 2 != 0 {
            let _ = writeln!(out, "Error: hex number length must be even");
            return;
        }
        if hex.len() > SHELL_SEND_MAX * 2 {
            let _ = writeln!(out, "Error: over {} bytes of data", SHELL_SEND_MAX);
            return;
        }

        let mut data = [0u8; SHELL_SEND_MAX];
        let mut count = 0;
        for pair in hex.as_bytes().chunks_exact(2) {
            // "0x"/"0X" prefixes sneak into pasted strings; skip them
            if pair == b"0x" || pair == b"0X" {
                continue;
            }
            data[count] = hex_pair(pair);
            count += 1;
        }

        self.transmit(&data[..count]);
    }

    /// `baud <rate>`: reconfigure the baud rate, keeping the other line
    /// parameters. Silent on parse or port failure.
    fn shell_baud(&mut self, arg: Option<&str>) {
        let rate = match arg.and_then(|v| v.parse::<u32>().ok()) {
            Some(rate) => rate,
            None => return,
        };

        let params = PortConfig {
            baudrate: rate,
            ..self.config.port
        };

        if self.port.configure(&params).is_ok() {
            self.config.port = params;
            save_config(&mut self.store, self.module_id, &mut self.config);
        }
    }

    /// `reset`: back to defaults, persisted.
    fn shell_reset(&mut self) {
        self.config = UartConfig::default();
        save_config(&mut self.store, self.module_id, &mut self.config);
    }

    /// Pulse the transceiver into transmit, write, drop back to listen.
    fn transmit(&mut self, bytes: &[u8]) {
        self.pins.enter_transmit();
        self.port.write(bytes);
        self.pins.enter_receive();
    }

    fn status(&self, code: ReplyCode) -> ReplyFrame {
        ReplyFrame::status(self.module_id, code)
    }
}

/// Interpret command data as a mode string.
///
/// Payload buffers are often NUL-padded; everything from the first NUL on
/// is ignored. Non-UTF-8 payloads read as empty and fail the parse.
fn mode_text(data: &[u8]) -> &str {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    core::str::from_utf8(&data[..end]).unwrap_or("")
}

/// Decode one two-digit hex pair. Lenient: the scan stops at the first
/// non-digit, so `5G` decodes to 0x05 and a pair with no leading digit
/// to 0x00.
fn hex_pair(pair: &[u8]) -> u8 {
    let mut value = 0;
    for &b in pair {
        match (b as char).to_digit(16) {
            Some(d) => value = (value << 4) | d as u8,
            None => break,
        }
    }
    value
}
