/*!
 * Fatal Precondition Tests
 *
 * Violations abort the process, so each case re-runs this test binary as a
 * child restricted to one test, with SHMEM_FATAL_CHILD set, and inspects
 * the child's exit status and stderr.
 */

use shmem_sync::{CmpOp, ShmemConfig, SymAddr, SymPtr, World};
use std::process::Command;

const CHILD_ENV: &str = "SHMEM_FATAL_CHILD";

fn in_child() -> bool {
    std::env::var_os(CHILD_ENV).is_some()
}

/// Run `test_name` in a child process and return (success, stderr)
fn run_child(test_name: &str) -> (bool, String) {
    let exe = std::env::current_exe().unwrap();
    let output = Command::new(exe)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn solo() -> World {
    World::new(ShmemConfig::new(1).with_symmetric_size(64)).unwrap()
}

#[test]
fn unknown_comparison_aborts() {
    if in_child() {
        solo().run(|pe| {
            let ivars = pe.alloc_array::<i32>(2).unwrap();
            pe.wait_until_all(ivars, None, 99, 0);
        });
        return;
    }

    let (success, stderr) = run_child("unknown_comparison_aborts");
    assert!(!success);
    assert!(stderr.contains("99"), "stderr: {stderr}");
    assert!(stderr.contains("shmem: fatal"), "stderr: {stderr}");
}

#[test]
fn unknown_comparison_aborts_before_blocking() {
    if in_child() {
        solo().run(|pe| {
            // would never be satisfied if the operator were accepted
            let flag = pe.alloc::<u64>().unwrap();
            pe.wait_until(flag, 0, 1);
        });
        return;
    }

    let (success, stderr) = run_child("unknown_comparison_aborts_before_blocking");
    assert!(!success);
    assert!(stderr.contains("Unknown comparison operator code 0"), "stderr: {stderr}");
}

#[test]
fn non_symmetric_address_aborts() {
    if in_child() {
        solo().run(|pe| {
            let outside = SymPtr::<u32>::new(SymAddr(4096));
            pe.test(outside, CmpOp::Eq, 0);
        });
        return;
    }

    let (success, stderr) = run_child("non_symmetric_address_aborts");
    assert!(!success);
    assert!(stderr.contains("not symmetric"), "stderr: {stderr}");
}

#[test]
fn status_length_mismatch_aborts() {
    if in_child() {
        solo().run(|pe| {
            let ivars = pe.alloc_array::<i16>(3).unwrap();
            let status: &[i32] = &[1, 1];
            pe.test_some(ivars, Some(status), CmpOp::Eq, 0);
        });
        return;
    }

    let (success, stderr) = run_child("status_length_mismatch_aborts");
    assert!(!success);
    assert!(stderr.contains("status has 2 entries, expected 3"), "stderr: {stderr}");
}

#[test]
fn use_after_finalize_aborts() {
    if in_child() {
        solo().run(|pe| {
            let flag = pe.alloc::<i32>().unwrap();
            pe.finalize();
            pe.put_value(flag, 1, 0);
        });
        return;
    }

    let (success, stderr) = run_child("use_after_finalize_aborts");
    assert!(!success);
    assert!(stderr.contains("not initialized"), "stderr: {stderr}");
}
