use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use futures_util::FutureExt;

use cinea_irqmux::config::Config;
use cinea_irqmux::dispatch::{EventLoop, Handler};
use cinea_irqmux::error::{DispatchError, HubError, IrqError};
use cinea_irqmux::event::{Mask, Signaller};
use cinea_irqmux::io::{ByteSource, InterruptControl, SourceId};
use cinea_irqmux::keyboard::{KeyEvent, ScanCodeSet, VirtualKey};

/// 测试用字节源，测试代码可以在绑定之后继续写入
#[derive(Clone, Default)]
struct Feed(Rc<RefCell<VecDeque<u8>>>);

impl Feed {
    fn push(&self, bytes: &[u8]) {
        self.0.borrow_mut().extend(bytes.iter().copied());
    }

    fn pending(&self) -> usize {
        self.0.borrow().len()
    }
}

impl ByteSource for Feed {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.0.borrow_mut().pop_front()
    }
}

#[derive(Default)]
struct FakeIrq {
    lines: BTreeMap<SourceId, Signaller>,
    acked: Vec<SourceId>,
    released: Vec<SourceId>,
    reject_bind: Option<SourceId>,
    reject_ack: Option<SourceId>,
    /// 线路断开前还有一次中断到达
    late_signal: bool,
}

impl FakeIrq {
    /// 模拟设备中断
    fn fire(&self, id: SourceId) {
        self.lines[&id].signal();
    }
}

impl InterruptControl for FakeIrq {
    fn bind(&mut self, id: SourceId, signaller: Signaller) -> Result<(), IrqError> {
        if self.reject_bind == Some(id) {
            return Err(IrqError::Rejected("no such device"));
        }
        self.lines.insert(id, signaller);
        Ok(())
    }

    fn acknowledge(&mut self, id: SourceId) -> Result<(), IrqError> {
        if self.reject_ack == Some(id) {
            return Err(IrqError::Rejected("line stuck"));
        }
        self.acked.push(id);
        Ok(())
    }

    fn release(&mut self, id: SourceId) {
        if let Some(signaller) = self.lines.get(&id) {
            if self.late_signal {
                signaller.signal();
            }
        }
        self.lines.remove(&id);
        self.released.push(id);
    }
}

#[derive(Debug, PartialEq)]
enum Seen {
    Key(SourceId, KeyEvent),
    Serial(SourceId, u8),
    Tick(SourceId),
}

#[derive(Default)]
struct Recorder(Vec<Seen>);

impl Handler for Recorder {
    fn key_event(&mut self, id: SourceId, event: KeyEvent) {
        self.0.push(Seen::Key(id, event));
    }

    fn serial_byte(&mut self, id: SourceId, byte: u8) {
        self.0.push(Seen::Serial(id, byte));
    }

    fn tick(&mut self, id: SourceId) {
        self.0.push(Seen::Tick(id));
    }
}

const SERIAL_A: SourceId = SourceId(10);
const SERIAL_B: SourceId = SourceId(11);
const KEYBOARD: SourceId = SourceId(12);

struct Rig {
    event_loop: EventLoop<FakeIrq>,
    serial_a: Feed,
    serial_b: Feed,
    keyboard: Feed,
}

fn rig() -> Rig {
    let mut event_loop = EventLoop::new(FakeIrq::default());
    let (serial_a, serial_b, keyboard) = (Feed::default(), Feed::default(), Feed::default());
    let a = event_loop.bind_serial(SERIAL_A, serial_a.clone()).unwrap();
    let b = event_loop.bind_serial(SERIAL_B, serial_b.clone()).unwrap();
    let k = event_loop
        .bind_keyboard(KEYBOARD, ScanCodeSet::Set2, keyboard.clone())
        .unwrap();
    assert_eq!((a.bit(), b.bit(), k.bit()), (0, 1, 2));
    Rig {
        event_loop,
        serial_a,
        serial_b,
        keyboard,
    }
}

#[test]
fn serial_and_keyboard_fire_together() {
    let mut rig = rig();
    rig.serial_a.push(b"unused");
    rig.serial_b.push(b"ok");
    rig.keyboard.push(&[0x1C, 0xF0, 0x1C]);
    rig.event_loop.irq().fire(KEYBOARD);
    rig.event_loop.irq().fire(SERIAL_B);

    let mut recorder = Recorder::default();
    let mask = rig.event_loop.run_once(&mut recorder).unwrap();
    assert_eq!(mask.len(), 2);

    // 低位tag先处理
    assert_eq!(
        recorder.0,
        [
            Seen::Serial(SERIAL_B, b'o'),
            Seen::Serial(SERIAL_B, b'k'),
            Seen::Key(KEYBOARD, KeyEvent::pressed(VirtualKey::A)),
            Seen::Key(KEYBOARD, KeyEvent::released(VirtualKey::A)),
        ]
    );
    assert_eq!(rig.event_loop.irq().acked, [SERIAL_B, KEYBOARD]);
    assert_eq!(rig.serial_a.pending(), 6);
    assert_eq!(rig.keyboard.pending(), 0);
}

#[test]
fn first_serial_and_keyboard_fire_together() {
    let mut rig = rig();
    rig.serial_a.push(b"hi");
    rig.serial_b.push(b"unused");
    rig.keyboard.push(&[0x1C, 0xF0, 0x1C]);
    rig.event_loop.irq().fire(SERIAL_A);
    rig.event_loop.irq().fire(KEYBOARD);

    let mut recorder = Recorder::default();
    let mask = rig.event_loop.run_once(&mut recorder).unwrap();
    assert_eq!(mask.raw(), 0b101);
    assert_eq!(
        recorder.0,
        [
            Seen::Serial(SERIAL_A, b'h'),
            Seen::Serial(SERIAL_A, b'i'),
            Seen::Key(KEYBOARD, KeyEvent::pressed(VirtualKey::A)),
            Seen::Key(KEYBOARD, KeyEvent::released(VirtualKey::A)),
        ]
    );
    assert_eq!(rig.event_loop.irq().acked, [SERIAL_A, KEYBOARD]);
    assert_eq!(rig.serial_b.pending(), 6);
}

#[test]
fn decoder_state_survives_between_wakeups() {
    let mut rig = rig();
    let mut recorder = Recorder::default();

    rig.keyboard.push(&[0xE0, 0xF0]);
    rig.event_loop.irq().fire(KEYBOARD);
    rig.event_loop.run_once(&mut recorder).unwrap();
    assert!(recorder.0.is_empty());

    rig.keyboard.push(&[0x75]);
    rig.event_loop.irq().fire(KEYBOARD);
    rig.event_loop.run_once(&mut recorder).unwrap();
    assert_eq!(recorder.0, [Seen::Key(KEYBOARD, KeyEvent::released(VirtualKey::Up))]);
    assert_eq!(rig.event_loop.irq().acked, [KEYBOARD, KEYBOARD]);
}

#[test]
fn empty_source_is_still_acknowledged() {
    let mut rig = rig();
    rig.event_loop.irq().fire(SERIAL_A);
    let mut recorder = Recorder::default();
    rig.event_loop.run_once(&mut recorder).unwrap();
    assert!(recorder.0.is_empty());
    assert_eq!(rig.event_loop.irq().acked, [SERIAL_A]);
}

#[test]
fn failed_acknowledge_is_fatal() {
    let mut rig = rig();
    rig.event_loop.irq_mut().reject_ack = Some(SERIAL_B);
    rig.serial_b.push(b"x");
    rig.event_loop.irq().fire(SERIAL_B);
    rig.event_loop.irq().fire(KEYBOARD);

    let mut recorder = Recorder::default();
    let err = rig.event_loop.run(&mut recorder).unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnacknowledgedInterrupt {
            id: SERIAL_B,
            cause: IrqError::Rejected("line stuck"),
        }
    );
    // 键盘在出错之后不再被处理
    assert_eq!(recorder.0, [Seen::Serial(SERIAL_B, b'x')]);
    assert!(rig.event_loop.irq().acked.is_empty());
}

#[test]
fn unbound_tag_in_flight_is_skipped() {
    let mut rig = rig();
    let tag = rig.event_loop.hub().registered().iter().nth(1).unwrap();
    rig.event_loop.irq().fire(SERIAL_B);
    let stale = rig.event_loop.hub().poll();
    assert_eq!(stale, Mask::from(tag));

    let removed = rig.event_loop.unbind(tag).unwrap();
    assert_eq!(removed.id(), SERIAL_B);
    assert_eq!(rig.event_loop.irq().released, [SERIAL_B]);

    let mut recorder = Recorder::default();
    assert_eq!(rig.event_loop.dispatch(stale, &mut recorder), Ok(()));
    assert!(recorder.0.is_empty());
    assert!(rig.event_loop.irq().acked.is_empty());
}

#[test]
fn interrupt_during_unbind_leaves_no_pending_bit() {
    let mut irq = FakeIrq::default();
    irq.late_signal = true;
    let mut event_loop = EventLoop::new(irq);
    let timer = SourceId(0);
    let tag = event_loop.bind_timer(timer).unwrap();

    let removed = event_loop.unbind(tag).unwrap();
    assert_eq!(removed.id(), timer);
    assert_eq!(event_loop.irq().released, [timer]);
    assert!(event_loop.hub().registered().is_empty());
    assert!(event_loop.hub().poll().is_empty());
}

#[test]
fn bind_failure_frees_the_tag() {
    let mut irq = FakeIrq::default();
    irq.reject_bind = Some(SERIAL_A);
    let mut event_loop = EventLoop::new(irq);

    let err = event_loop.bind_serial(SERIAL_A, Feed::default()).unwrap_err();
    assert_eq!(
        err,
        DispatchError::Bind {
            id: SERIAL_A,
            cause: IrqError::Rejected("no such device"),
        }
    );
    assert!(event_loop.hub().is_empty());

    let tag = event_loop.bind_serial(SERIAL_B, Feed::default()).unwrap();
    assert_eq!(tag.bit(), 0);
}

#[test]
fn capacity_comes_from_config() {
    let config = Config {
        hub_capacity: 1,
        ..Config::default()
    };
    let mut event_loop = EventLoop::from_config(&config, FakeIrq::default()).unwrap();
    event_loop.bind_timer(SourceId(0)).unwrap();
    assert_eq!(
        event_loop.bind_timer(SourceId(1)).unwrap_err(),
        DispatchError::Hub(HubError::CapacityExceeded { capacity: 1 })
    );
}

#[test]
fn timer_source_ticks() {
    let mut event_loop = EventLoop::new(FakeIrq::default());
    let timer = SourceId(3);
    event_loop.bind_timer(timer).unwrap();
    event_loop.irq().fire(timer);

    let mut recorder = Recorder::default();
    event_loop.run_once(&mut recorder).unwrap();
    assert_eq!(recorder.0, [Seen::Tick(timer)]);
}

#[test]
fn async_loop_suspends_when_idle() {
    let mut rig = rig();
    rig.serial_a.push(b"z");
    rig.event_loop.irq().fire(SERIAL_A);

    let mut recorder = Recorder::default();
    assert!(rig.event_loop.run_async(&mut recorder).now_or_never().is_none());
    assert_eq!(recorder.0, [Seen::Serial(SERIAL_A, b'z')]);

    rig.event_loop.irq_mut().reject_ack = Some(KEYBOARD);
    rig.event_loop.irq().fire(KEYBOARD);
    let result = rig.event_loop.run_async(&mut recorder).now_or_never();
    assert!(matches!(
        result,
        Some(Err(DispatchError::UnacknowledgedInterrupt { id: KEYBOARD, .. }))
    ));
}
