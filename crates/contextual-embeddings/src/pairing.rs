//! The encoder/embedder pairing and its size invariant.
//!
//! A tokenizer's vocabulary and a model's input embedding table are two views
//! of one piece of state: row i of the table belongs to vocabulary entry i.
//! Mutating the vocabulary without resizing the table leaves the pair in an
//! inconsistent state where any forward pass is undefined. `ModelPair` owns
//! both halves and exposes only paired mutation, so that intermediate state
//! is never observable from outside.

use crate::embedder::{ResizableEmbedder, SequenceEmbedder};
use crate::encoder::TextEncoder;
use crate::error::{Error, Result};
use crate::keyword::{extract_at, locate_keyword};
use candle_core::Tensor;

/// Check the pairing invariant for a raw encoder/embedder combination.
///
/// Exposed for callers holding unpaired components; `ModelPair` runs this
/// before every forward pass.
pub fn check_sizes(vocab_size: usize, table_size: usize) -> Result<()> {
    if vocab_size != table_size {
        return Err(Error::SizeMismatch {
            vocab_size,
            table_size,
        });
    }
    Ok(())
}

/// An encoder and embedder owned as a single unit of consistency.
#[derive(Debug)]
pub struct ModelPair<E, M> {
    encoder: E,
    embedder: M,
}

impl<E: TextEncoder, M: SequenceEmbedder> ModelPair<E, M> {
    /// Pair an encoder with an embedder.
    ///
    /// Fails with [`Error::SizeMismatch`] if the two do not already agree on
    /// size, e.g. when the tokenizer was mutated before pairing.
    pub fn new(encoder: E, embedder: M) -> Result<Self> {
        check_sizes(encoder.vocab_size(), embedder.input_table_size())?;
        Ok(Self { encoder, embedder })
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn embedder(&self) -> &M {
        &self.embedder
    }

    /// Assert that vocabulary size and input table size agree.
    pub fn check_consistency(&self) -> Result<()> {
        check_sizes(self.encoder.vocab_size(), self.embedder.input_table_size())
    }

    /// Encode a batch of texts and run a forward pass over it.
    ///
    /// The consistency check runs first; a mismatch is terminal for this
    /// call and is never retried.
    pub fn forward(&self, texts: &[String]) -> Result<Tensor> {
        let rows = self.encoder.encode_batch(texts, true)?;
        self.forward_rows(&rows)
    }

    fn forward_rows(&self, rows: &[Vec<u32>]) -> Result<Tensor> {
        self.check_consistency()?;
        self.embedder.forward(rows)
    }

    /// The full pipeline: encode padded, forward, locate the keyword in each
    /// sequence, extract its vector.
    ///
    /// Returns one D-dimensional vector per input text, in input order. Every
    /// text must contain the keyword exactly as a single vocabulary entry.
    pub fn keyword_embeddings(&self, texts: &[String], keyword: &str) -> Result<Vec<Vec<f32>>> {
        let target = self.encoder.keyword_id(keyword)?;
        let rows = self.encoder.encode_batch(texts, true)?;
        let positions = locate_keyword(&rows, target)?;

        #[cfg(feature = "debug")]
        log::debug!("keyword id {target} located at positions {positions:?}");

        let embeddings = self.forward_rows(&rows)?;
        extract_at(&embeddings, &positions)
    }

    /// Embed the keyword in isolation, as a one-word text.
    ///
    /// This is the conventional "no context" baseline for comparing against
    /// in-context vectors. It is a modeling convention, not ground truth;
    /// treat comparisons against it as qualitative.
    pub fn reference_embedding(&self, keyword: &str) -> Result<Vec<f32>> {
        let mut vectors = self.keyword_embeddings(&[keyword.to_string()], keyword)?;
        Ok(vectors.remove(0))
    }
}

impl<E: TextEncoder, M: ResizableEmbedder> ModelPair<E, M> {
    /// Extend the vocabulary and resize the input table in one step.
    ///
    /// Returns the new shared size. The new table rows are
    /// default-initialized by the embedder (untrained, random), so embeddings
    /// of added words carry no meaning until the provider trains them.
    pub fn add_words_and_resize(&mut self, words: &[String]) -> Result<usize> {
        let new_size = self.encoder.add_vocabulary_entries(words)?;
        self.embedder.resize_input_table(new_size)?;
        self.check_consistency()?;

        #[cfg(feature = "debug")]
        log::debug!("vocabulary extended to {new_size} entries, table resized to match");

        Ok(new_size)
    }
}
