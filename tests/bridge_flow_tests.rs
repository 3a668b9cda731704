//! End-to-end bridge tests: init paths, reconfiguration, rx pipeline

use std::cell::RefCell;
use std::rc::Rc;

use uart_bridge::config::store::{encode_record, ConfigStore};
use uart_bridge::{
    CommandCode, CommandFrame, DataBits, EventSink, FramePublisher, HalfDuplexPins, Parity,
    PortConfig, ReplyCode, ReplyFrame, RxAccumulator, RxEventQueue, StopBits, UartBridge,
    UartConfig, UartPort,
};

const MODULE_ID: u8 = 7;
const IDLE_US: i64 = 50_000;

#[test]
fn test_init_defaults_when_store_empty() {
    let mut rig = rig_with_record(None);

    rig.bridge.init().expect("init");

    assert!(!rig.bridge.config().valid);
    assert_eq!(rig.bridge.config().port, PortConfig::default());
    assert_eq!(rig.uart.borrow().configs, vec![PortConfig::default()]);
    assert_eq!(
        *rig.pin_events.borrow(),
        vec![PinEvent::ReLow, PinEvent::DeLow],
        "init leaves the transceiver in receive mode"
    );
}

#[test]
fn test_init_loads_persisted_record() {
    let saved = UartConfig {
        valid: true,
        uart_dev: 2,
        port: PortConfig {
            baudrate: 57_600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::Two,
        },
    };
    let mut rig = rig_with_record(Some(encode_record(&saved).to_vec()));

    rig.bridge.init().expect("init");

    assert_eq!(*rig.bridge.config(), saved);
    assert_eq!(rig.uart.borrow().configs, vec![saved.port]);
}

#[test]
fn test_init_ignores_erased_record() {
    let mut rig = rig_with_record(Some(vec![0xFF; 9]));

    rig.bridge.init().expect("init");

    assert!(!rig.bridge.config().valid);
    assert_eq!(rig.bridge.config().port, PortConfig::default());
}

#[test]
fn test_init_ignores_record_with_unknown_fields() {
    let saved = UartConfig {
        valid: true,
        uart_dev: 1,
        port: PortConfig::default(),
    };
    let mut record = encode_record(&saved).to_vec();
    record[8] = 0x40;
    let mut rig = rig_with_record(Some(record));

    rig.bridge.init().expect("init");

    assert!(!rig.bridge.config().valid);
    assert_eq!(rig.bridge.config().port, PortConfig::default());
}

#[test]
fn test_init_fails_when_port_rejects_config() {
    let mut rig = rig_with_record(None);
    rig.uart.borrow_mut().reject_configure = true;

    assert!(rig.bridge.init().is_err());
    assert!(
        rig.pin_events.borrow().is_empty(),
        "a failed init must not touch the direction pins"
    );
}

#[test]
fn test_set_parameters_then_send_uses_new_line() {
    let mut rig = rig_with_record(None);
    rig.bridge.init().expect("init");
    rig.uart.borrow_mut().configs.clear();

    let mut cmd = vec![CommandCode::SetParameters as u8];
    cmd.extend_from_slice(b"9600-8E1");
    let reply = rig.bridge.handle_command(CommandFrame::new(&cmd));
    assert_eq!(reply.reply_code(), ReplyCode::BaudrateSet as u8);

    let reply = rig.bridge.handle_command(CommandFrame::new(&[
        CommandCode::SendAll as u8,
        b'h',
        b'i',
    ]));
    assert_eq!(reply.reply_code(), ReplyCode::Sent as u8);

    assert_eq!(
        rig.uart.borrow().configs,
        vec![PortConfig {
            baudrate: 9600,
            data_bits: DataBits::Nine,
            parity: Parity::Even,
            stop_bits: StopBits::One,
        }]
    );
    assert_eq!(rig.uart.borrow().writes, vec![b"hi".to_vec()]);
}

#[test]
fn test_rx_pipeline_publishes_received_frame() {
    let queue: RxEventQueue = RxEventQueue::new();
    let accumulator = RxAccumulator::new(&queue);
    let mut publisher = FramePublisher::new(&queue, MODULE_ID);
    let mut sink = CollectSink::default();

    let mut now = 0;
    for &byte in b"ping" {
        accumulator.on_byte(now, byte);
        now += 100;
    }
    assert_eq!(publisher.service(&mut sink), 0, "nothing published mid-frame");

    assert!(accumulator.poll(now + IDLE_US));
    assert_eq!(publisher.service(&mut sink), 1);

    let frame = &sink.frames[0];
    assert_eq!(frame.module_id(), MODULE_ID);
    assert_eq!(frame.reply_code(), ReplyCode::Received as u8);
    assert_eq!(frame.payload(), b"ping");
}

#[test]
fn test_rx_pipeline_reports_overflow() {
    let queue: RxEventQueue = RxEventQueue::new();
    let accumulator = RxAccumulator::new(&queue);
    let mut publisher = FramePublisher::new(&queue, MODULE_ID);
    let mut sink = CollectSink::default();

    for i in 0..129 {
        accumulator.on_byte(i, 0xAA);
    }
    assert!(!accumulator.poll(129 + IDLE_US), "overflow disarms the deadline");

    assert_eq!(publisher.service(&mut sink), 1);
    let frame = &sink.frames[0];
    assert_eq!(frame.reply_code(), ReplyCode::ErrOverflow as u8);
    assert!(frame.payload().is_empty());
}

#[test]
fn test_settings_survive_restart() {
    let store = MemStore::default();

    let mut rig = rig_with_store(store.clone());
    rig.bridge.init().expect("init");
    let mut cmd = vec![CommandCode::SetParameters as u8];
    cmd.extend_from_slice(b"19200-8N2");
    let reply = rig.bridge.handle_command(CommandFrame::new(&cmd));
    assert_eq!(reply.reply_code(), ReplyCode::BaudrateSet as u8);
    drop(rig);

    let mut rig = rig_with_store(store);
    rig.bridge.init().expect("init");

    let config = rig.bridge.config();
    assert!(config.valid);
    assert_eq!(config.port.baudrate, 19_200);
    assert_eq!(config.port.data_bits, DataBits::Eight);
    assert_eq!(config.port.parity, Parity::None);
    assert_eq!(config.port.stop_bits, StopBits::Two);
}

// --- Fixture ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinEvent {
    ReHigh,
    DeHigh,
    ReLow,
    DeLow,
}

type PinLog = Rc<RefCell<Vec<PinEvent>>>;

#[derive(Default)]
struct UartState {
    writes: Vec<Vec<u8>>,
    configs: Vec<PortConfig>,
    reject_configure: bool,
}

struct MockUart {
    state: Rc<RefCell<UartState>>,
}

#[derive(Debug)]
struct ConfigRejected;

impl UartPort for MockUart {
    type Error = ConfigRejected;

    fn configure(&mut self, config: &PortConfig) -> Result<(), ConfigRejected> {
        let mut state = self.state.borrow_mut();
        if state.reject_configure {
            return Err(ConfigRejected);
        }
        state.configs.push(*config);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) {
        self.state.borrow_mut().writes.push(bytes.to_vec());
    }
}

struct MockPin {
    high_event: PinEvent,
    low_event: PinEvent,
    log: PinLog,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(self.low_event);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(self.high_event);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemStore {
    record: Rc<RefCell<Option<Vec<u8>>>>,
}

impl ConfigStore for MemStore {
    fn load(&mut self, _module_id: u8, buf: &mut [u8]) -> Option<usize> {
        let record = self.record.borrow();
        let record = record.as_ref()?;
        let n = record.len().min(buf.len());
        buf[..n].copy_from_slice(&record[..n]);
        Some(n)
    }

    fn save(&mut self, _module_id: u8, data: &[u8]) -> bool {
        *self.record.borrow_mut() = Some(data.to_vec());
        true
    }
}

#[derive(Default)]
struct CollectSink {
    frames: Vec<ReplyFrame>,
}

impl EventSink for CollectSink {
    fn publish(&mut self, frame: &ReplyFrame) {
        self.frames.push(frame.clone());
    }
}

struct Rig {
    bridge: UartBridge<MockUart, MockPin, MockPin, MemStore>,
    uart: Rc<RefCell<UartState>>,
    pin_events: PinLog,
}

fn rig_with_store(store: MemStore) -> Rig {
    let pin_events: PinLog = Rc::new(RefCell::new(Vec::new()));
    let uart_state = Rc::new(RefCell::new(UartState::default()));

    let uart = MockUart {
        state: Rc::clone(&uart_state),
    };
    let pins = HalfDuplexPins::new(
        MockPin {
            high_event: PinEvent::ReHigh,
            low_event: PinEvent::ReLow,
            log: Rc::clone(&pin_events),
        },
        MockPin {
            high_event: PinEvent::DeHigh,
            low_event: PinEvent::DeLow,
            log: Rc::clone(&pin_events),
        },
    );

    Rig {
        bridge: UartBridge::new(MODULE_ID, uart, pins, store),
        uart: uart_state,
        pin_events,
    }
}

fn rig_with_record(record: Option<Vec<u8>>) -> Rig {
    let store = MemStore::default();
    *store.record.borrow_mut() = record;
    rig_with_store(store)
}
