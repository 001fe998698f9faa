/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 *
 * Two classes exist:
 * - Recoverable errors (configuration, heap exhaustion, context limits) are
 *   returned as `ShmemResult`.
 * - Precondition violations are passed to [`fatal`], which reports and aborts.
 *   Continuing past one would issue remote operations against undefined memory.
 */

use super::types::{ContextId, PeId, SymAddr};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ShmemError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(shmem::invalid_config),
        help("Check SHMEM_* environment variables or the JSON configuration.")
    )]
    InvalidConfig(String),

    #[error("Library not initialized")]
    #[diagnostic(
        code(shmem::not_initialized),
        help("Entry points may only be called between initialization and finalize.")
    )]
    NotInitialized,

    #[error("Address {addr} (len {len}) is not symmetric: partition holds {heap_len} bytes")]
    #[diagnostic(
        code(shmem::not_symmetric),
        help("Only memory obtained from the symmetric allocator may be targeted.")
    )]
    NotSymmetric {
        addr: SymAddr,
        len: usize,
        heap_len: usize,
    },

    #[error("Address {addr} is not aligned to {alignment} bytes")]
    #[diagnostic(code(shmem::misaligned))]
    Misaligned { addr: SymAddr, alignment: usize },

    #[error("PE {pe} out of range for a team of {size} PEs")]
    #[diagnostic(code(shmem::invalid_pe))]
    InvalidPe { pe: PeId, size: usize },

    #[error("Unknown comparison operator code {0}")]
    #[diagnostic(
        code(shmem::unknown_cmp),
        help("Valid codes are EQ=1, NE=2, GT=3, LE=4, LT=5, GE=6.")
    )]
    UnknownComparison(i32),

    #[error("{what} has {actual} entries, expected {expected}")]
    #[diagnostic(code(shmem::length_mismatch))]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Symmetric heap exhausted: requested {requested} bytes, available {available} bytes")]
    #[diagnostic(
        code(shmem::heap_exhausted),
        help("Raise SHMEM_SYMMETRIC_SIZE.")
    )]
    HeapExhausted { requested: usize, available: usize },

    #[error("Context limit reached ({0} live contexts)")]
    #[diagnostic(
        code(shmem::context_limit),
        help("Destroy unused contexts or raise SHMEM_MAX_CONTEXTS.")
    )]
    ContextLimit(usize),

    #[error("Context {0} does not exist or was destroyed")]
    #[diagnostic(code(shmem::unknown_context))]
    UnknownContext(ContextId),

    #[error("The default context cannot be destroyed")]
    #[diagnostic(code(shmem::default_context))]
    DefaultContext,

    #[error("Context {0} must be destroyed by the thread that created it")]
    #[diagnostic(code(shmem::context_thread))]
    WrongThread(ContextId),

    #[error("Corrupted lock word at {addr}: {detail}")]
    #[diagnostic(
        code(shmem::corrupted_lock),
        help("Lock memory must be zero-initialized symmetric memory used only by lock calls.")
    )]
    CorruptedLock { addr: SymAddr, detail: String },
}

/// Report a precondition violation and terminate the process
///
/// Emits a `tracing` error, a plain one-line diagnostic, and the rendered
/// miette report on stderr before aborting.
#[cold]
pub fn fatal(err: ShmemError) -> ! {
    tracing::error!(error = %err, "fatal precondition violation");
    eprintln!("shmem: fatal: {err}");
    eprintln!("{:?}", miette::Report::new(err));
    std::process::abort()
}

/// Unwrap a precondition result, aborting on violation
#[inline]
pub fn require(result: Result<(), ShmemError>) {
    if let Err(err) = result {
        fatal(err);
    }
}
