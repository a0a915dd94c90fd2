/*!
 * Object Table and Handle Tests
 */

use crate::common::*;
use horizon_kernel::memory::GuestRead;
use horizon_kernel::objects::handles::{CURRENT_PROCESS, CURRENT_THREAD};
use horizon_kernel::svc::numbers;
use horizon_kernel::thread::ProcessorId;
use horizon_kernel::{KernelError, ObjectKind, ResetType, ResultCode, ThreadStatus};
use pretty_assertions::assert_eq;

#[test]
fn test_reset_layout() {
    let k = kernel();

    let kinds: Vec<_> = (0..6).map(|h| k.object_kind(h)).collect();
    assert_eq!(
        kinds,
        vec![
            Some(ObjectKind::Dummy),
            Some(ObjectKind::Process),
            Some(ObjectKind::ResourceLimit),
            Some(ObjectKind::Thread),
            Some(ObjectKind::Port),
            Some(ObjectKind::Port),
        ]
    );
    assert_eq!(k.objects().len(), 6);
    assert_eq!(k.process_handle(), 1);
    assert_eq!(k.resource_limit_handle(), 2);
    assert_eq!(k.srv_port(), 4);
    assert_eq!(k.error_port(), 5);
}

#[test]
fn test_boot_threads() {
    let k = kernel();

    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.user_threads().len(), 1);
    let main = k.thread(0).unwrap();
    assert_eq!(main.status, ThreadStatus::Running);
    assert_eq!(main.handle, Some(3));
    assert_eq!(main.priority, 0x30);

    let idle = k.idle_thread();
    assert_eq!(idle.index, 32);
    assert_eq!(idle.handle, None);
    assert_eq!(idle.priority, 0x40);
    assert_eq!(idle.status, ThreadStatus::Ready);
    assert_eq!(idle.entrypoint, 0xBFC0_0000);
    // mov r0, #0
    assert_eq!(k.memory().read32(0xBFC0_0000), 0xE3A0_0000);
}

#[test]
fn test_handles_are_sequential() {
    let mut k = kernel();
    let a = create_event(&mut k, ResetType::OneShot);
    let b = create_event(&mut k, ResetType::Sticky);
    assert_eq!((a, b), (6, 7));
    assert_eq!(k.object_kind(b), Some(ObjectKind::Event));
}

#[test]
fn test_pseudo_handles() {
    let mut k = kernel();
    assert_eq!(k.resolve_handle(CURRENT_THREAD), 3);
    assert_eq!(k.resolve_handle(CURRENT_PROCESS), 1);
    assert_eq!(k.object_kind(CURRENT_PROCESS), Some(ObjectKind::Process));

    let (r0, id) = svc(&mut k, numbers::GET_THREAD_ID, &[0, CURRENT_THREAD]);
    assert_eq!((r0, id), (0, 0));

    let (r0, pid) = svc(&mut k, numbers::GET_PROCESS_ID, &[0, CURRENT_PROCESS]);
    assert_eq!((r0, pid), (0, 1));
}

#[test]
fn test_duplicate_handle() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);

    assert_eq!(svc(&mut k, numbers::DUPLICATE_HANDLE, &[0, CURRENT_THREAD]), (0, 3));
    assert_eq!(svc(&mut k, numbers::DUPLICATE_HANDLE, &[0, CURRENT_PROCESS]), (0, 1));
    assert_eq!(svc(&mut k, numbers::DUPLICATE_HANDLE, &[0, event]), (0, event));

    let (r0, _) = svc(&mut k, numbers::DUPLICATE_HANDLE, &[0, 999]);
    assert_eq!(r0, ResultCode::INVALID_HANDLE.raw());
}

#[test]
fn test_close_handle() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);

    assert_eq!(svc(&mut k, numbers::CLOSE_HANDLE, &[event]).0, 0);
    // Slots are never reused
    assert_eq!(k.object_kind(event), Some(ObjectKind::Event));
    assert_eq!(svc(&mut k, numbers::CLOSE_HANDLE, &[0xFFFF_800C]).0, 0);
    assert_eq!(
        svc(&mut k, numbers::CLOSE_HANDLE, &[999]).0,
        ResultCode::INVALID_HANDLE.raw()
    );
}

#[test]
fn test_typed_lookup_rejects_mismatch() {
    let mut k = kernel();
    let event = create_event(&mut k, ResetType::OneShot);

    assert_eq!(svc(&mut k, numbers::RELEASE_MUTEX, &[event]).0, ResultCode::INVALID_HANDLE.raw());
    assert_eq!(svc(&mut k, numbers::SIGNAL_EVENT, &[3]).0, ResultCode::INVALID_HANDLE.raw());
    assert!(k.get_object::<horizon_kernel::sync::Mutex>(event).is_none());
    assert!(k.get_object::<horizon_kernel::sync::Event>(event).is_some());
}

#[test]
fn test_reset_discards_objects() {
    let mut k = kernel();
    create_event(&mut k, ResetType::OneShot);
    create_thread(&mut k, 0x20);

    k.reset().unwrap();
    assert_eq!(k.objects().len(), 6);
    assert_eq!(k.user_threads().len(), 1);
    assert_eq!(k.current_thread(), 0);
    assert_eq!(k.current_timestamp(), 0);
}

#[test]
fn test_thread_slots_exhausted() {
    let mut k = kernel();
    for _ in 1..32 {
        k.make_thread(ENTRY, STACK, 0, 0x30, ProcessorId::AppCore).unwrap();
    }
    assert_eq!(k.user_threads().len(), 32);

    let err = k
        .make_thread(ENTRY, STACK, 0, 0x30, ProcessorId::AppCore)
        .unwrap_err();
    assert!(matches!(err, KernelError::ResourceLimitExceeded(_)));
}

#[test]
fn test_invalid_reset_type() {
    let mut k = kernel();
    let (r0, _) = svc(&mut k, numbers::CREATE_EVENT, &[0, 3]);
    assert_eq!(r0, ResultCode::INVALID_ENUM_VALUE.raw());
    assert_eq!(k.objects().len(), 6);
}

#[test]
fn test_memory_block() {
    let mut k = kernel();

    let (r0, _) = svc(&mut k, numbers::CREATE_MEMORY_BLOCK, &[1, 0x1000_0000, 0x800, 3]);
    assert_eq!(r0, ResultCode::MISALIGNED_SIZE.raw());

    let (r0, _) = svc(&mut k, numbers::CREATE_MEMORY_BLOCK, &[1, 0x1000_0000, 0x1000, 9]);
    assert_eq!(r0, ResultCode::INVALID_COMBINATION.raw());

    let (r0, handle) = svc(&mut k, numbers::CREATE_MEMORY_BLOCK, &[1, 0x1000_0000, 0x2000, 3]);
    assert_eq!(r0, 0);
    assert_eq!(k.object_kind(handle), Some(ObjectKind::MemoryBlock));
    let block = k.get_object::<horizon_kernel::objects::MemoryBlock>(handle).unwrap();
    assert_eq!(block.size, 0x2000);
    assert!(!block.mapped);
}
