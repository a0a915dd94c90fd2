/*!
 * Wait Protocol Tests
 * Events, semaphores, mutexes and the WaitSynchronization family
 */

use crate::common::*;
use horizon_kernel::kernel::NO_INDEX;
use horizon_kernel::memory::GuestWrite;
use horizon_kernel::svc::numbers;
use horizon_kernel::sync::{Event, Mutex, Semaphore};
use horizon_kernel::{EventType, NullDevices, ResetType, ResultCode, ThreadStatus};
use pretty_assertions::assert_eq;

const TIMEOUT: u32 = ResultCode::TIMEOUT.raw();

fn fired(k: &horizon_kernel::Kernel, event: u32) -> bool {
    k.get_object::<Event>(event).unwrap().fired
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_one_shot_event_clears_on_acquire() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);

    assert_eq!(wait1(&mut k, event, 0).0, TIMEOUT);
    signal(&mut k, event);
    assert_eq!(wait1(&mut k, event, 0).0, 0);
    assert_eq!(wait1(&mut k, event, 0).0, TIMEOUT);
}

#[test]
fn test_sticky_event_stays_signalled() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::Sticky);
    signal(&mut k, event);

    assert_eq!(wait1(&mut k, event, 0).0, 0);
    assert_eq!(wait1(&mut k, event, 0).0, 0);

    assert_eq!(svc(&mut k, numbers::CLEAR_EVENT, &[event]).0, 0);
    assert_eq!(wait1(&mut k, event, 0).0, TIMEOUT);
}

#[test]
fn test_pulse_without_waiters_is_lost() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::Pulse);
    signal(&mut k, event);
    assert!(!fired(&k, event));
    assert_eq!(wait1(&mut k, event, 0).0, TIMEOUT);
}

#[test]
fn test_pulse_wakes_every_waiter() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::Pulse);
    for _ in 0..2 {
        create_thread(&mut k, 0x20);
        wait1(&mut k, event, -1);
        assert_eq!(k.current_thread(), 0);
    }

    signal(&mut k, event);
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::Running);
    assert_eq!(k.thread(2).unwrap().status, ThreadStatus::Ready);
    assert_eq!(reg_of(&k, 2, 0), 0);
    assert!(!fired(&k, event));
}

#[test]
fn test_one_shot_wakes_first_blocked_waiter_only() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);

    create_thread(&mut k, 0x28);
    wait1(&mut k, event, -1);
    create_thread(&mut k, 0x20);
    wait1(&mut k, event, -1);
    assert_eq!(k.current_thread(), 0);

    signal(&mut k, event);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.thread(2).unwrap().status, ThreadStatus::WaitSync1);
    assert!(!fired(&k, event));

    let waitlist: Vec<_> = k.get_object::<Event>(event).unwrap().waitlist.iter().collect();
    assert_eq!(waitlist, vec![2]);
}

#[test]
fn test_signal_bad_handle() {
    let mut k = kernel();
    assert_eq!(signal(&mut k, 0x777), ResultCode::INVALID_HANDLE.raw());
}

// =============================================================================
// Semaphores
// =============================================================================

#[test]
fn test_semaphore_counts() {
    let mut k = kernel();
    let (r0, sem) = svc(&mut k, numbers::CREATE_SEMAPHORE, &[0, 1, 2]);
    assert_eq!(r0, 0);

    assert_eq!(wait1(&mut k, sem, 0).0, 0);
    assert_eq!(wait1(&mut k, sem, 0).0, TIMEOUT);
    assert_eq!(k.get_object::<Semaphore>(sem).unwrap().available, 0);

    assert_eq!(svc(&mut k, numbers::RELEASE_SEMAPHORE, &[0, sem, 2]), (0, 0));
    let (r0, _) = svc(&mut k, numbers::RELEASE_SEMAPHORE, &[0, sem, 1]);
    assert_eq!(r0, ResultCode::OUT_OF_RANGE.raw());
    assert_eq!(k.get_object::<Semaphore>(sem).unwrap().available, 2);
}

#[test]
fn test_semaphore_creation_errors() {
    let mut k = kernel();
    let (r0, _) = svc(&mut k, numbers::CREATE_SEMAPHORE, &[0, (-1i32) as u32, 2]);
    assert_eq!(r0, ResultCode::OUT_OF_RANGE.raw());
    let (r0, _) = svc(&mut k, numbers::CREATE_SEMAPHORE, &[0, 3, 2]);
    assert_eq!(r0, ResultCode::INVALID_COMBINATION.raw());
}

#[test]
fn test_semaphore_release_wakes_waiter() {
    let mut k = kernel();
    let (_, sem) = svc(&mut k, numbers::CREATE_SEMAPHORE, &[0, 0, 1]);
    create_thread(&mut k, 0x20);
    wait1(&mut k, sem, -1);
    assert_eq!(k.current_thread(), 0);

    svc(&mut k, numbers::RELEASE_SEMAPHORE, &[0, sem, 1]);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.reg(0), 0);
    assert_eq!(k.get_object::<Semaphore>(sem).unwrap().available, 0);
}

#[test]
fn test_semaphore_release_wakes_in_block_order() {
    let mut k = kernel();
    let (_, sem) = svc(&mut k, numbers::CREATE_SEMAPHORE, &[0, 0, 5]);
    create_thread(&mut k, 0x28);
    wait1(&mut k, sem, -1);
    create_thread(&mut k, 0x20);
    wait1(&mut k, sem, -1);
    assert_eq!(k.current_thread(), 0);

    svc(&mut k, numbers::RELEASE_SEMAPHORE, &[0, sem, 1]);
    assert_eq!(k.current_thread(), 1);
    assert_eq!(k.thread(2).unwrap().status, ThreadStatus::WaitSync1);
    assert_eq!(k.get_object::<Semaphore>(sem).unwrap().available, 0);
}

// =============================================================================
// Mutexes
// =============================================================================

#[test]
fn test_mutex_recursion_and_handoff() {
    let mut k = kernel();
    let (_, mutex) = svc(&mut k, numbers::CREATE_MUTEX, &[0, 1]);
    assert_eq!(wait1(&mut k, mutex, 0).0, 0);
    assert_eq!(k.get_object::<Mutex>(mutex).unwrap().lock_count, 2);

    create_thread(&mut k, 0x20);
    let (r0, _) = svc(&mut k, numbers::RELEASE_MUTEX, &[mutex]);
    assert_eq!(r0, ResultCode::INVALID_MUTEX_RELEASE.raw());
    wait1(&mut k, mutex, -1);
    assert_eq!(k.current_thread(), 0);

    svc(&mut k, numbers::RELEASE_MUTEX, &[mutex]);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::WaitSync1);

    svc(&mut k, numbers::RELEASE_MUTEX, &[mutex]);
    assert_eq!(k.current_thread(), 1);
    let m = k.get_object::<Mutex>(mutex).unwrap();
    assert_eq!((m.owner, m.lock_count), (Some(1), 1));
}

// =============================================================================
// WaitSynchronizationN
// =============================================================================

#[test]
fn test_wait_any_handle_array_wraps_address_space() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::Sticky);
    let e2 = create_event(&mut k, ResetType::Sticky);
    signal(&mut k, e2);
    k.memory_mut().write32(0xFFFF_FFFC, e1);
    k.memory_mut().write32(0, e2);

    let (r0, r1) = svc(&mut k, numbers::WAIT_SYNCHRONIZATION_N, &[0, 0xFFFF_FFFC, 2, 0, 0]);
    assert_eq!((r0, r1), (0, 1));
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::Running);
}

#[test]
fn test_wait_any_reports_first_ready_index() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::Sticky);
    let e2 = create_event(&mut k, ResetType::Sticky);
    signal(&mut k, e2);

    assert_eq!(wait_n(&mut k, &[e1, e2], false, 0), (0, 1));
}

#[test]
fn test_wait_any_woken_by_signal_before_timeout() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::OneShot);
    let e2 = create_event(&mut k, ResetType::OneShot);
    create_thread(&mut k, 0x20);

    wait_n(&mut k, &[e1, e2], false, 1000);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::WaitSyncAny);
    assert!(k.event_queue().contains(EventType::ThreadWakeup));

    signal(&mut k, e2);
    assert_eq!(k.current_thread(), 1);
    assert_eq!((k.reg(0), k.reg(1)), (0, 1));
    assert!(!k.event_queue().contains(EventType::ThreadWakeup));
    assert!(k.get_object::<Event>(e1).unwrap().waitlist.is_empty());

    k.add_ticks(1000);
    k.poll_events(&mut NullDevices).unwrap();
    assert_eq!(k.metrics().timeouts(), 0);
    assert_eq!((k.reg(0), k.reg(1)), (0, 1));
}

#[test]
fn test_wait_any_timeout() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::OneShot);
    create_thread(&mut k, 0x20);
    wait_n(&mut k, &[e1], false, 1000);
    assert_eq!(k.current_thread(), 0);

    k.add_ticks(268);
    k.poll_events(&mut NullDevices).unwrap();
    assert_eq!(k.current_thread(), 1);
    assert_eq!((k.reg(0), k.reg(1)), (TIMEOUT, NO_INDEX));
    assert_eq!(k.metrics().timeouts(), 1);
    assert!(k.get_object::<Event>(e1).unwrap().waitlist.is_empty());
}

#[test]
fn test_wait_all_blocks_until_every_object_is_ready() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::OneShot);
    let e2 = create_event(&mut k, ResetType::OneShot);
    create_thread(&mut k, 0x20);
    wait_n(&mut k, &[e1, e2], true, -1);
    assert_eq!(k.current_thread(), 0);

    signal(&mut k, e1);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.thread(1).unwrap().status, ThreadStatus::WaitSyncAll);
    assert!(fired(&k, e1));

    signal(&mut k, e2);
    assert_eq!(k.current_thread(), 1);
    assert_eq!((k.reg(0), k.reg(1)), (0, NO_INDEX));
    assert!(!fired(&k, e1));
    assert!(!fired(&k, e2));
}

#[test]
fn test_wait_all_immediate() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::OneShot);
    let e2 = create_event(&mut k, ResetType::Sticky);
    signal(&mut k, e1);
    signal(&mut k, e2);

    assert_eq!(wait_n(&mut k, &[e1, e2], true, 0), (0, NO_INDEX));
    assert!(!fired(&k, e1));
    assert!(fired(&k, e2));
}

#[test]
fn test_wait_n_argument_errors() {
    let mut k = kernel();
    let e1 = create_event(&mut k, ResetType::OneShot);

    let (r0, _) = svc(&mut k, numbers::WAIT_SYNCHRONIZATION_N, &[0, SCRATCH, (-1i32) as u32, 0, 0]);
    assert_eq!(r0, ResultCode::OUT_OF_RANGE.raw());
    let (r0, _) = svc(&mut k, numbers::WAIT_SYNCHRONIZATION_N, &[0, SCRATCH, 65, 0, 0]);
    assert_eq!(r0, ResultCode::OUT_OF_RANGE.raw());

    let (r0, _) = wait_n(&mut k, &[e1, 0x999], false, -1);
    assert_eq!(r0, ResultCode::INVALID_HANDLE.raw());
    assert_eq!(k.thread(0).unwrap().status, ThreadStatus::Running);
    assert!(k.get_object::<Event>(e1).unwrap().waitlist.is_empty());
}

#[test]
fn test_wait_n_zero_handles_times_out() {
    let mut k = kernel();
    assert_eq!(wait_n(&mut k, &[], false, 0), (TIMEOUT, NO_INDEX));
}

// =============================================================================
// Waitability
// =============================================================================

#[test]
fn test_waitable_kinds() {
    let mut k = kernel();

    // Service endpoints and ports are always ready
    let port = k.srv_port();
    assert_eq!(wait1(&mut k, 0xFFFF_800C, 0).0, 0);
    assert_eq!(wait1(&mut k, port, 0).0, 0);

    // A process never signals
    let process = k.process_handle();
    assert_eq!(wait1(&mut k, process, 0).0, TIMEOUT);

    // Resource limits and arbiters cannot be waited on
    let resource_limit = k.resource_limit_handle();
    assert_eq!(wait1(&mut k, resource_limit, 0).0, ResultCode::INVALID_HANDLE.raw());
    let (_, arbiter) = svc(&mut k, numbers::CREATE_ADDRESS_ARBITER, &[]);
    assert_eq!(wait1(&mut k, arbiter, 0).0, ResultCode::INVALID_HANDLE.raw());
}

#[test]
fn test_wait1_timeout_expires() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);
    wait1(&mut k, event, 2000);
    assert_eq!(k.current_thread(), 32);
    assert_eq!(k.cycles_until_next_event(), 536);

    k.add_ticks(536);
    assert_eq!(k.poll_events(&mut NullDevices).unwrap(), 1);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.reg(0), TIMEOUT);
    assert!(k.get_object::<Event>(event).unwrap().waitlist.is_empty());
}
