/*!
 * Port, Session and err:f Tests
 */

use crate::common::*;
use crate::support::*;
use horizon_kernel::memory::GuestWrite;
use horizon_kernel::{KernelError, ObjectKind, ResetType, ResultCode};
use pretty_assertions::assert_eq;

#[test]
fn test_connect_to_builtin_ports() {
    let mut k = kernel();

    let (r0, srv) = connect(&mut k, "srv:");
    assert_eq!((r0, srv), (0, 6));
    assert_eq!(k.object_kind(srv), Some(ObjectKind::Session));

    let (r0, err) = connect(&mut k, "err:f");
    assert_eq!((r0, err), (0, 7));
    let session = k.get_object::<horizon_kernel::objects::Session>(err).unwrap();
    assert_eq!(session.port, k.error_port());
}

#[test]
fn test_connect_errors() {
    let mut k = kernel();
    assert_eq!(connect(&mut k, "abcdefghijkl").0, ResultCode::PORT_NAME_TOO_LONG.raw());
    assert_eq!(connect(&mut k, "abcdefghijk").0, ResultCode::NOT_FOUND.raw());
    assert_eq!(connect(&mut k, "srv").0, ResultCode::NOT_FOUND.raw());
    assert_eq!(k.objects().len(), 6);
}

#[test]
fn test_send_to_bad_handle() {
    let mut k = kernel();
    assert_eq!(send(&mut k, 0x999), ResultCode::INVALID_HANDLE.raw());

    let event = create_event(&mut k, ResetType::OneShot);
    assert_eq!(send(&mut k, event), ResultCode::INVALID_HANDLE.raw());
}

#[test]
fn test_session_on_unserved_port_is_fatal() {
    let mut k = kernel();
    k.make_port("test:p").unwrap();
    let (_, session) = connect(&mut k, "test:p");

    write_request(&mut k, &[0x0001_0000]);
    assert_eq!(
        try_send(&mut k, session),
        Err(KernelError::UnknownService("test:p".into()))
    );
}

#[test]
fn test_error_port_throw_with_message() {
    let mut k = kernel();
    let (_, session) = connect(&mut k, "err:f");

    write_request(&mut k, &[0x0001_0800, 0, 0x0010_0000, 0x0010_0000, 1]);
    let base = cmdbuf(&k).base();
    k.memory_mut().write8(base + 4, 4);
    k.memory_mut().write_bytes(base + 0x24, b"oops\0");

    let err = try_send(&mut k, session).unwrap_err();
    assert_eq!(
        err,
        KernelError::GuestFatal("type 4 at pc 0x00100000 (process 1): oops".into())
    );
}

#[test]
fn test_error_port_throw_without_message() {
    let mut k = kernel();
    let (_, session) = connect(&mut k, "err:f");

    write_request(&mut k, &[0x0001_0800, 1, 0, 0x0010_0200, 1]);
    let err = try_send(&mut k, session).unwrap_err();
    assert_eq!(
        err,
        KernelError::GuestFatal("type 1 at pc 0x00100200 (process 1)".into())
    );
}

#[test]
fn test_error_port_unknown_command() {
    let mut k = kernel();
    let (_, session) = connect(&mut k, "err:f");
    write_request(&mut k, &[0x0002_0000]);

    assert_eq!(
        try_send(&mut k, session),
        Err(KernelError::UnknownServiceCommand { service: "err:f".into(), command: 0x0002_0000 })
    );
}

#[test]
fn test_malformed_header_is_fatal() {
    let mut k = kernel();
    let (_, session) = connect(&mut k, "srv:");

    write_request(&mut k, &[0x0001_0FFF]);
    assert_eq!(
        try_send(&mut k, session),
        Err(KernelError::MalformedIpcHeader(0x0001_0FFF))
    );

    // One translate word cannot hold a two-handle copy descriptor
    write_request(&mut k, &[0x0001_0001, 0x0400_0000]);
    assert_eq!(
        try_send(&mut k, session),
        Err(KernelError::MalformedIpcHeader(0x0001_0001))
    );
}
