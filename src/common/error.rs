use thiserror::Error;

// Error
//------------------------------------------------------------------------------

/// Errors surfaced by the encoding pipeline. Encoding either fully succeeds
/// with a populated grid or fails with exactly one of these; there is no
/// partial-success mode.
#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    /// Data needs more bits than the selected (or maximum) version and error
    /// correction level can hold.
    #[error("data needs {required} bits but only {capacity} are available")]
    CapacityExceeded { required: usize, capacity: usize },

    /// A byte cannot be represented in any mode the selected symbol permits.
    #[error("byte {byte:#04x} at position {position} cannot be encoded")]
    InvalidCharacter { position: usize, byte: u8 },

    /// Explicit options are incompatible with each other or with the symbol.
    #[error("invalid options: {0}")]
    InvalidOption(&'static str),

    /// The assembled codeword stream does not match the version's codeword
    /// count. A defect in the encoder, not a user error.
    #[error("codeword stream is {got} bits, expected {expected}")]
    InvariantViolation { expected: usize, got: usize },
}

pub type QRResult<T> = Result<T, QRError>;
