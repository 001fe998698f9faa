/*!
 * Point-to-Point Synchronization
 *
 * Blocking `wait_until*` and non-blocking `test*` over symmetric integer
 * arrays, for every supported width and the fixed comparison set. All
 * variants share one scan core.
 */

mod check;
mod cmp;
pub(crate) mod scan;
mod spin;
mod wait;

pub use cmp::{CmpCode, CmpOp, CMP_EQ, CMP_GE, CMP_GT, CMP_LE, CMP_LT, CMP_NE};
pub use spin::ProgressSpin;
