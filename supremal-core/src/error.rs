//! The error type shared by the storage layer and the automaton engine.

use thiserror::Error;

/// Errors surfaced by the sparse storage layer and the operations built on it.
///
/// All algorithmic code reports failures through this type immediately; there
/// are no retries and no silent fallbacks. Invariant violations that cannot be
/// reached through the public API are guarded by assertions instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A state or event index lies outside the declared bounds.
    #[error("index {index} is out of range (bound {bound})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The exclusive bound it was checked against.
        bound: usize,
    },
    /// A read-side matrix operation was invoked while edits were still
    /// pending; call `make_compressed` first.
    #[error("matrix has pending edits and must be compressed before reading")]
    NotCompressed,
    /// A write would give some state two successors under the same event.
    /// Only raised with the `strict` feature; the default policy overwrites.
    #[error("write would make the transition function nondeterministic")]
    NonDeterministic,
    /// Supervisor synthesis pruned every state of the composition.
    #[error("supervisor synthesis produced an empty composition")]
    EmptyComposition,
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
