/*!
 * Service Handler Tests
 * Dispatch through service handles, event callbacks and request latency
 */

use crate::common::*;
use crate::support::*;
use horizon_kernel::core::types::GuestAddr;
use horizon_kernel::memory::GuestRead;
use horizon_kernel::svc::numbers;
use horizon_kernel::sync::EventCallback;
use horizon_kernel::{
    CommandBuffer, HostRequest, Kernel, KernelConfig, KernelError, KernelResult, ResetType,
    ResultCode, ServiceHandler, ServiceId, ThreadStatus,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Log {
    /// (message address, command word, word 2 as seen by the handler)
    requests: Vec<(GuestAddr, u32, u32)>,
    callbacks: Vec<u32>,
    resets: usize,
}

/// Handler that records every call and optionally signals an event
struct Recorder {
    id: ServiceId,
    log: Rc<RefCell<Log>>,
    signal_on_request: Option<u32>,
    reenter: bool,
}

impl Recorder {
    fn install(k: &mut Kernel, id: ServiceId) -> Rc<RefCell<Log>> {
        let log = Rc::new(RefCell::new(Log::default()));
        k.register_service(
            id,
            Box::new(Recorder { id, log: Rc::clone(&log), signal_on_request: None, reenter: false }),
        );
        log
    }
}

impl ServiceHandler for Recorder {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn handle_request(&mut self, kernel: &mut Kernel, message: GuestAddr) -> KernelResult<()> {
        let buf = CommandBuffer::at(message);
        let command = buf.read(kernel.memory(), 0);
        let word2 = buf.read(kernel.memory(), 2);
        self.log.borrow_mut().requests.push((message, command, word2));

        if self.reenter {
            kernel.dispatch_service(self.id, message)?;
        }
        if let Some(event) = self.signal_on_request {
            kernel
                .signal_event(event)
                .map_err(|code| KernelError::InvalidState(code.to_string().into()))?;
        }
        buf.write_response(kernel.memory_mut(), command >> 16, 1, 0, ResultCode::SUCCESS);
        Ok(())
    }

    fn on_event_signalled(&mut self, _kernel: &mut Kernel, tag: u32) -> KernelResult<()> {
        self.log.borrow_mut().callbacks.push(tag);
        Ok(())
    }

    fn reset(&mut self) {
        self.log.borrow_mut().resets += 1;
    }
}

#[test]
fn test_request_reaches_handler() {
    let mut k = kernel();
    let log = Recorder::install(&mut k, ServiceId::Fs);

    write_request(&mut k, &[0x0801_00C2, 1, 2, 3, 0x20, 0]);
    assert_eq!(send(&mut k, 0xFFFF_800C), 0);

    let log = log.borrow();
    let requests = &log.requests;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, 0x1FF8_2080);
    assert_eq!(requests[0].1, 0x0801_00C2);
    assert_eq!(reply_word(&k, 0), 0x0801_0040);
    // CallingPid payload
    assert_eq!(reply_word(&k, 5), 1);
}

#[test]
fn test_unregistered_service_is_fatal() {
    let mut k = kernel();
    write_request(&mut k, &[0x0001_0000]);
    assert_eq!(
        try_send(&mut k, ServiceId::Gpu.handle()),
        Err(KernelError::UnknownService("GSP::GPU".into()))
    );
}

#[test]
fn test_register_replaces_handler() {
    let mut k = kernel();
    let first = Recorder::install(&mut k, ServiceId::Cfg);
    let second = Recorder::install(&mut k, ServiceId::Cfg);

    write_request(&mut k, &[0x0001_0000]);
    send(&mut k, ServiceId::Cfg.handle());
    assert!(first.borrow().requests.is_empty());
    assert_eq!(second.borrow().requests.len(), 1);
}

#[test]
fn test_reentering_busy_service_is_fatal() {
    let mut k = kernel();
    let log = Rc::new(RefCell::new(Log::default()));
    k.register_service(
        ServiceId::Hid,
        Box::new(Recorder { id: ServiceId::Hid, log: Rc::clone(&log), signal_on_request: None, reenter: true }),
    );

    write_request(&mut k, &[0x0001_0000]);
    assert_eq!(
        try_send(&mut k, ServiceId::Hid.handle()),
        Err(KernelError::ServiceBusy("HID".into()))
    );

    // The handler is back in its slot afterwards
    write_request(&mut k, &[0x0001_0000]);
    assert!(try_send(&mut k, ServiceId::Hid.handle()).is_err());
    assert_eq!(log.borrow().requests.len(), 2);
}

#[test]
fn test_handler_signal_wakes_waiter() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);
    let log = Rc::new(RefCell::new(Log::default()));
    k.register_service(
        ServiceId::Apt,
        Box::new(Recorder { id: ServiceId::Apt, log, signal_on_request: Some(event), reenter: false }),
    );

    create_thread(&mut k, 0x20);
    wait1(&mut k, event, -1);
    assert_eq!(k.current_thread(), 0);

    write_request(&mut k, &[0x0001_0000]);
    assert_eq!(send(&mut k, ServiceId::Apt.handle()), 0);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::Ready);
}

#[test]
fn test_event_callback_delivered_after_signal() {
    let mut k = kernel();
    let log = Recorder::install(&mut k, ServiceId::Dsp);
    let event = k
        .make_event_with_callback(ResetType::OneShot, EventCallback { service: ServiceId::Dsp, tag: 7 })
        .unwrap();

    signal(&mut k, event);
    assert_eq!(log.borrow().callbacks, vec![7]);

    let mut producer = k.take_host_producer().unwrap();
    producer.push(HostRequest::SignalEvent(event)).unwrap();
    k.drain_host_requests().unwrap();
    assert_eq!(log.borrow().callbacks, vec![7, 7]);
}

#[test]
fn test_callback_for_unregistered_service_is_dropped() {
    let mut k = kernel();
    let event = k
        .make_event_with_callback(ResetType::Sticky, EventCallback { service: ServiceId::Y2r, tag: 1 })
        .unwrap();
    assert_eq!(signal(&mut k, event), 0);
    assert_eq!(wait1(&mut k, event, 0).0, 0);
}

#[test]
fn test_reset_notifies_handlers() {
    let mut k = kernel();
    let log = Recorder::install(&mut k, ServiceId::Ptm);
    k.reset().unwrap();
    k.reset().unwrap();
    assert_eq!(log.borrow().resets, 2);
}

#[test]
fn test_sync_request_delays_caller() {
    let mut k = Kernel::new(KernelConfig::default()).unwrap();
    let log = Recorder::install(&mut k, ServiceId::Fs);

    write_request(&mut k, &[0x0001_0000]);
    k.set_reg(0, ServiceId::Fs.handle());
    k.service_svc(numbers::SEND_SYNC_REQUEST).unwrap();

    assert_eq!(log.borrow().requests.len(), 1);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::WaitSleep);
    assert_eq!(k.current_thread(), 32);
    assert_eq!(k.thread(0).unwrap().context.gprs[0], 0);
    assert_eq!(k.thread(0).unwrap().wakeup_tick, 10_456);

    k.add_ticks(10_456);
    k.poll_events(&mut horizon_kernel::NullDevices).unwrap();
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.memory().read32(0x1FF8_2080), 0x0001_0040);
}
