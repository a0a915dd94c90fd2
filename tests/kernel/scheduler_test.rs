/*!
 * Scheduler Tests
 * Priority selection, yielding, sleeping and thread lifecycle
 */

use crate::common::*;
use horizon_kernel::cpu::{cpsr, PC};
use horizon_kernel::objects::handles::CURRENT_THREAD;
use horizon_kernel::svc::numbers;
use horizon_kernel::thread::ProcessorId;
use horizon_kernel::{EventType, NullDevices, ResetType, ResultCode, ThreadStatus};
use pretty_assertions::assert_eq;

#[test]
fn test_highest_priority_runs_first() {
    let mut k = kernel();
    k.make_thread(ENTRY, STACK, 0, 20, ProcessorId::AppCore).unwrap();
    k.make_thread(ENTRY, STACK, 0, 10, ProcessorId::AppCore).unwrap();
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::Ready);
    assert_eq!(k.thread(2).unwrap().status, ThreadStatus::Ready);

    k.reschedule();
    assert_eq!(k.current_thread(), 2);
    assert_eq!(k.thread(2).unwrap().status, ThreadStatus::Running);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::Ready);
}

#[test]
fn test_create_thread_preempts_lower_priority_caller() {
    let mut k = kernel();
    let handle = create_thread(&mut k, 0x20);

    assert_eq!(handle, 6);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.reg(PC), ENTRY);
    assert_eq!(k.reg(0), 0);
    assert_eq!(k.metrics().context_switches(), 1);
}

#[test]
fn test_equal_priority_does_not_preempt() {
    let mut k = kernel();
    create_thread(&mut k, 0x30);
    assert_eq!(k.current_thread(), 0);
}

#[test]
fn test_create_thread_argument_errors() {
    let mut k = kernel();

    let (r0, _) = svc(&mut k, numbers::CREATE_THREAD, &[0x40, ENTRY, 0, STACK, DEFAULT_CORE]);
    assert_eq!(r0, ResultCode::BAD_THREAD_PRIORITY.raw());

    let (r0, _) = svc(&mut k, numbers::CREATE_THREAD, &[0x20, ENTRY, 0, STACK, 5]);
    assert_eq!(r0, ResultCode::OUT_OF_RANGE.raw());

    assert_eq!(k.user_threads().len(), 1);
}

#[test]
fn test_yield_rotates_equal_priority() {
    let mut k = kernel();
    create_thread(&mut k, 0x30);

    svc(&mut k, numbers::SLEEP_THREAD, &[0, 0]);
    assert_eq!(k.current_thread(), 1);

    svc(&mut k, numbers::SLEEP_THREAD, &[0, 0]);
    assert_eq!(k.current_thread(), 0);
}

#[test]
fn test_sleep_runs_idle_then_wakes() {
    let mut k = kernel();

    svc(&mut k, numbers::SLEEP_THREAD, &[1000, 0]);
    assert_eq!(k.current_thread(), 32);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::WaitSleep);
    assert_eq!(k.event_queue().scheduled_at(EventType::ThreadWakeup), Some(268));

    k.add_ticks(267);
    k.poll_events(&mut NullDevices).unwrap();
    assert_eq!(k.current_thread(), 32);

    k.add_ticks(1);
    k.poll_events(&mut NullDevices).unwrap();
    assert_eq!(k.current_thread(), 0);
    assert!(!k.event_queue().contains(EventType::ThreadWakeup));
}

#[test]
fn test_bad_handle_wait_changes_nothing() {
    let mut k = kernel();

    let (r0, _) = wait1(&mut k, 0xFFFF_FFFF, -1);
    assert_eq!(r0, ResultCode::INVALID_HANDLE.raw());

    let main = k.thread(0).unwrap();
    assert_eq!(main.status, ThreadStatus::Running);
    assert!(main.wait_list.is_empty());
    assert_eq!(k.current_thread(), 0);
    assert!(!k.needs_reschedule());
    assert!(!k.event_queue().contains(EventType::ThreadWakeup));
}

#[test]
fn test_set_thread_priority_reschedules() {
    let mut k = kernel();
    let t = create_thread(&mut k, 0x38);
    assert_eq!(k.current_thread(), 0);

    let (r0, _) = svc(&mut k, numbers::SET_THREAD_PRIORITY, &[t, 0x40]);
    assert_eq!(r0, ResultCode::BAD_THREAD_PRIORITY.raw());

    let (r0, _) = svc(&mut k, numbers::SET_THREAD_PRIORITY, &[t, 0x10]);
    assert_eq!(r0, 0);
    assert_eq!(k.current_thread(), 1);

    let (r0, priority) = svc(&mut k, numbers::GET_THREAD_PRIORITY, &[0, CURRENT_THREAD]);
    assert_eq!((r0, priority), (0, 0x10));
}

#[test]
fn test_exit_thread_wakes_joiner() {
    let mut k = kernel();
    let t = create_thread(&mut k, 0x38);

    // Main joins the lower-priority thread, which then runs and exits
    wait1(&mut k, t, -1);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::WaitSync1);

    svc(&mut k, numbers::EXIT_THREAD, &[]);
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::Dead);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.reg(0), 0);

    // A dead thread stays signalled
    let (r0, _) = wait1(&mut k, t, 0);
    assert_eq!(r0, 0);
}

#[test]
fn test_exit_releases_owned_mutex() {
    let mut k = kernel();
    let t = create_thread(&mut k, 0x20);
    assert_eq!(k.current_thread(), 1);

    let (_, mutex) = svc(&mut k, numbers::CREATE_MUTEX, &[0, 1]);
    svc(&mut k, numbers::EXIT_THREAD, &[]);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.thread_by_handle(t).unwrap().status, ThreadStatus::Dead);

    let (r0, _) = wait1(&mut k, mutex, 0);
    assert_eq!(r0, 0);
    let owner = k.get_object::<horizon_kernel::sync::Mutex>(mutex).unwrap().owner;
    assert_eq!(owner, Some(0));
}

#[test]
fn test_processor_number_and_thread_id() {
    let mut k = kernel();
    let t = create_thread(&mut k, 0x38);

    let (core, _) = svc(&mut k, numbers::GET_CURRENT_PROCESSOR_NUMBER, &[]);
    assert_eq!(core, 0);
    assert_eq!(svc(&mut k, numbers::GET_THREAD_ID, &[0, t]), (0, 1));
    let (r0, _) = svc(&mut k, numbers::GET_THREAD_ID, &[0, 0x1234]);
    assert_eq!(r0, ResultCode::INVALID_HANDLE.raw());
}

#[test]
fn test_setup_main_thread_thumb_entry() {
    let mut k = kernel();
    k.setup_main_thread(0x0010_0001);

    assert_eq!(k.reg(PC), 0x0010_0000);
    assert_eq!(k.engine().cpsr(), cpsr::USER_MODE | cpsr::THUMB);
    assert_eq!(k.thread(0).unwrap().entrypoint, 0x0010_0001);
}

#[test]
fn test_signal_from_lower_priority_switches_to_waiter() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);
    create_thread(&mut k, 0x20);
    assert_eq!(k.current_thread(), 1);

    wait1(&mut k, event, -1);
    assert_eq!(k.current_thread(), 0);

    signal(&mut k, event);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::Ready);
}
