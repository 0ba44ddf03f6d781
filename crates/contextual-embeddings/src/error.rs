//! Failure contract for the analysis pipeline.
//!
//! Every error here is surfaced immediately to the caller. Nothing is retried
//! or silently recovered: a degenerate input flowing into a similarity matrix
//! would corrupt the comparison results.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The target keyword id does not occur in an encoded sequence.
    #[error("keyword id {id} absent from sequence {row}")]
    KeywordNotFound { row: usize, id: u32 },

    /// The keyword string does not map to a single vocabulary entry
    /// (out-of-vocabulary words split into multiple sub-word pieces).
    #[error("keyword {word:?} maps to {pieces} vocabulary pieces, expected exactly 1")]
    KeywordNotSingleToken { word: String, pieces: usize },

    /// The encoder's vocabulary and the embedder's input table disagree.
    /// Extending a vocabulary must always be paired with a table resize.
    #[error(
        "vocabulary size {vocab_size} != embedder input table size {table_size} \
         (difference of {})",
        .vocab_size.abs_diff(*.table_size)
    )]
    SizeMismatch { vocab_size: usize, table_size: usize },

    /// A zero-norm vector was supplied to cosine similarity.
    #[error("vector {index} has zero norm, cosine similarity is undefined")]
    DegenerateVector { index: usize },

    /// The reference vector in a one-vs-many comparison has zero norm.
    #[error("reference vector has zero norm, cosine similarity is undefined")]
    DegenerateReference,

    /// Two vectors of different widths were compared.
    #[error("vector dimensions must match: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A keyword position points past the end of a sequence.
    #[error("position {position} out of range for sequence {row} of length {len}")]
    PositionOutOfRange { row: usize, position: usize, len: usize },

    /// The extractor received a position array that does not line up with the
    /// batch dimension of the embedding tensor.
    #[error("embedding tensor has {rows} rows but {positions} positions were supplied")]
    RowCountMismatch { rows: usize, positions: usize },

    /// A token id points past the end of the embedder's input table. This is
    /// the lookup-time symptom of an un-resized table.
    #[error("token id {id} out of range for input table of {table_size} rows")]
    IdOutOfRange { id: u32, table_size: usize },

    /// Batched sequences must be padded to a common length before a forward
    /// pass.
    #[error("sequence {row} has length {len}, expected {expected} (batch not padded?)")]
    RaggedBatch { row: usize, len: usize, expected: usize },

    /// The input table can only grow; rows are never dropped.
    #[error("cannot shrink input table from {current} to {requested} rows")]
    ShrinkInputTable { current: usize, requested: usize },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
