/*!
 * Point-to-Point Synchronization Integration Tests
 *
 * wait_until / test families across PEs, with remote writers
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::Rng;
use shmem_sync::{CmpOp, DeliveryMode, RemoteAtomics, ShmemConfig, World, CMP_GE};
use std::thread;
use std::time::Duration;

fn world(n_pes: usize) -> World {
    World::new(ShmemConfig::new(n_pes).with_symmetric_size(4096)).unwrap()
}

#[test]
fn test_some_before_and_after_remote_write() {
    let results = world(2).run(|pe| {
        let ivars = pe.alloc_array::<i32>(3).unwrap();
        let status: &[i32] = &[1, 1, 0];
        let mut seen = Vec::new();

        if pe.my_pe() == 1 {
            for (i, v) in [0, 5, 9].into_iter().enumerate() {
                pe.write(ivars.at(i), v);
            }
            seen.push(pe.test_some(ivars, Some(status), CmpOp::Ge, 5));
        }
        pe.barrier_all();

        if pe.my_pe() == 0 {
            pe.put_value(ivars.at(0), 5, 1);
            pe.quiet();
        }
        pe.barrier_all();

        if pe.my_pe() == 1 {
            seen.push(pe.test_some(ivars, Some(status), CMP_GE, 5));
        }
        seen
    });

    assert_eq!(results[0], Vec::<Vec<usize>>::new());
    assert_eq!(results[1], vec![vec![1], vec![0, 1]]);
}

#[test]
fn test_wait_until_all_with_remote_writers() {
    let results = world(4).run(|pe| {
        let ivars = pe.alloc_array::<u64>(3).unwrap();
        pe.barrier_all();

        if pe.my_pe() == 0 {
            pe.wait_until_all(ivars, None, CmpOp::Ge, 1);
            pe.read_array(ivars)
        } else {
            let jitter = rand::thread_rng().gen_range(0..200);
            thread::sleep(Duration::from_micros(jitter));
            pe.put_value(ivars.at(pe.my_pe() - 1), pe.my_pe() as u64, 0);
            pe.quiet();
            Vec::new()
        }
    });

    assert_eq!(results[0], vec![1, 2, 3]);
}

#[test]
fn test_wait_until_any_and_some_vector() {
    let results = world(2).run(|pe| {
        let ivars = pe.alloc_array::<i16>(4).unwrap();
        let targets = [10i16, 20, 30, 40];
        pe.barrier_all();

        if pe.my_pe() == 0 {
            pe.put_value(ivars.at(2), 30, 1);
            pe.quiet();
            pe.barrier_all();
            pe.put_value(ivars.at(3), 40, 1);
            pe.put_value(ivars.at(1), 20, 1);
            pe.quiet();
            (None, Vec::new())
        } else {
            let any = pe.wait_until_any_vector(ivars, None, CmpOp::Eq, &targets);
            pe.barrier_all();
            let status: &[i32] = &[0, 1, 1, 1];
            pe.wait_until_all_vector(ivars, Some(status), CmpOp::Eq, &targets);
            let some = pe.wait_until_some_vector(ivars, None, CmpOp::Eq, &targets);
            (any, some)
        }
    });

    assert_eq!(results[1], (Some(2), vec![1, 2, 3]));
}

#[test]
fn test_wait_until_some_returns_pass_snapshot() {
    let results = world(2).run(|pe| {
        let ivars = pe.alloc_array::<u32>(3).unwrap();
        pe.barrier_all();

        if pe.my_pe() == 0 {
            pe.put_value(ivars.at(1), 7, 1);
            pe.quiet();
            Vec::new()
        } else {
            pe.wait_until_some(ivars, None, CmpOp::Ne, 0)
        }
    });

    assert_eq!(results[1], vec![1]);
}

#[test]
fn test_eager_delivery_wait() {
    let config = ShmemConfig::new(3)
        .with_symmetric_size(256)
        .with_delivery(DeliveryMode::Eager);
    let results = World::new(config).unwrap().run(|pe| {
        let flag = pe.alloc::<i64>().unwrap();
        if pe.my_pe() == 2 {
            pe.wait_until(flag, CmpOp::Eq, 2);
        } else {
            pe.atomic_inc(flag, 2);
        }
        pe.barrier_all();
        pe.read(flag)
    });
    assert_eq!(results[2], 2);
}

#[test]
fn test_satisfied_test_implies_immediate_wait() {
    let results = world(1).run(|pe| {
        let ivars = pe.alloc_array::<i32>(2).unwrap();
        pe.write(ivars.at(0), 4);
        pe.write(ivars.at(1), 6);

        let held = pe.test_all(ivars, None, CmpOp::Gt, 3);
        pe.wait_until_all(ivars, None, CmpOp::Gt, 3);
        (held, pe.stats().wait_polls)
    });
    assert_eq!(results[0], (true, 0));
}

/// Reference answer for one pass over local values
fn model(values: &[i32], status: &[i32], op: CmpOp, rhs: i32) -> Vec<usize> {
    (0..values.len())
        .filter(|&i| status[i] != 0 && op.compare(values[i], rhs))
        .collect()
}

fn arb_case() -> impl Strategy<Value = (Vec<i32>, Vec<i32>, usize, i32)> {
    (1usize..8).prop_flat_map(|len| {
        (
            prop::collection::vec(-3i32..3, len),
            prop::collection::vec(0i32..2, len),
            0usize..6,
            -3i32..3,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_test_family_matches_model((values, status, op_index, rhs) in arb_case()) {
        let op = CmpOp::ALL[op_index];
        let expected = model(&values, &status, op, rhs);
        let selected = status.iter().filter(|&&s| s != 0).count();

        let observed = world(1).run(|pe| {
            let ivars = pe.alloc_array::<i32>(values.len()).unwrap();
            for (i, &v) in values.iter().enumerate() {
                pe.write(ivars.at(i), v);
            }
            (
                pe.test_some(ivars, Some(status.as_slice()), op, rhs),
                pe.test_any(ivars, Some(status.as_slice()), op.code(), rhs),
                pe.test_all(ivars, Some(status.as_slice()), op, rhs),
            )
        });

        let (some, any, all) = observed[0].clone();
        prop_assert_eq!(&some, &expected);
        prop_assert_eq!(any, expected.first().copied());
        prop_assert_eq!(all, expected.len() == selected);
    }
}
