// SPDX-License-Identifier: MIT

use super::*;
use std::io;

#[test]
fn pending_approval_is_sentinel() {
    let err = FlowError::PendingApproval;
    assert!(err.is_pending_approval());
    assert!(!err.is_cancelled());
}

#[test]
fn cancelled_is_sentinel() {
    let err = FlowError::ExecutionCancelled;
    assert!(err.is_cancelled());
    assert!(!err.is_pending_approval());
}

#[test]
fn io_errors_are_retryable() {
    let err = FlowError::io("exec", io::Error::new(io::ErrorKind::Other, "boom"));
    assert!(err.is_retryable());
}

#[test]
fn non_zero_exit_is_terminal() {
    let err = FlowError::NonZeroExit(1);
    assert!(!err.is_retryable());
}

#[test]
fn validation_error_is_terminal() {
    let err = FlowError::Validation { field: "id".into(), message: "duplicate".into() };
    assert!(!err.is_retryable());
}
