//! Stack headroom for the recursive tree walk.
//!
//! Every Lox call nests several Rust frames (`evaluate`, `call_value`,
//! `execute_block`, `execute`), so deep but legal recursion would exhaust a
//! thread's native stack long before the interpreter's own call limit.

/// Keep at least this much stack free before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
