//! Text encoding seam: raw text in, token ids out, and back again.
//!
//! Implementations:
//! - `HfTextEncoder`: HuggingFace `tokenizers` file (tokenizer.json)
//! - test mocks with hand-built vocabularies (see the tests/ directory)

use crate::error::{Error, Result};
use tokenizers::{AddedToken, Tokenizer};

/// Maps raw text to ordered sequences of token ids.
///
/// Unknown words are handled deterministically by sub-word splitting, so
/// encoding never fails on out-of-vocabulary input. Vocabulary mutation is
/// exposed here but callers should prefer going through
/// [`ModelPair::add_words_and_resize`](crate::ModelPair::add_words_and_resize),
/// which keeps the paired embedder's input table in step.
pub trait TextEncoder {
    /// Encode a batch of texts, including begin/end sentinel ids.
    ///
    /// When `pad` is true, sequences are right-padded with
    /// [`TextEncoder::pad_id`] to a common length. Padding carries no
    /// semantic content and never reaches the similarity comparator.
    fn encode_batch(&self, texts: &[String], pad: bool) -> Result<Vec<Vec<u32>>>;

    /// Decode a single id back to its surface piece.
    fn decode(&self, id: u32) -> Result<String>;

    /// Current vocabulary size, added entries included.
    fn vocab_size(&self) -> usize;

    /// Add new surface words to the vocabulary, returning the new size.
    fn add_vocabulary_entries(&mut self, words: &[String]) -> Result<usize>;

    /// The id used to right-pad batched sequences.
    fn pad_id(&self) -> u32;

    /// Resolve a keyword string to its single content token id.
    ///
    /// Fails with [`Error::KeywordNotSingleToken`] when the word decomposes
    /// into multiple sub-word pieces, since a multi-piece keyword has no
    /// single position to locate.
    fn keyword_id(&self, word: &str) -> Result<u32>;
}

/// `TextEncoder` backed by a HuggingFace tokenizer file.
pub struct HfTextEncoder {
    tokenizer: Tokenizer,
    pad_id: u32,
}

impl HfTextEncoder {
    /// Load from the raw bytes of a tokenizer.json file.
    pub fn from_bytes(tokenizer_json: &[u8]) -> Result<Self> {
        let tokenizer = Tokenizer::from_bytes(tokenizer_json)
            .map_err(|e| Error::Tokenizer(format!("failed to load tokenizer: {e}")))?;

        // WordPiece checkpoints put [PAD] at 0; fall back to 0 if unnamed.
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);

        Ok(Self { tokenizer, pad_id })
    }

    /// Encode a single text, optionally without the begin/end sentinels.
    ///
    /// The sentinel-free form is what drives the "content token count" view
    /// of the probe binary.
    pub fn encode_single(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, add_special_tokens)
            .map_err(|e| Error::Tokenizer(format!("tokenization failed: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl TextEncoder for HfTextEncoder {
    fn encode_batch(&self, texts: &[String], pad: bool) -> Result<Vec<Vec<u32>>> {
        let mut rows = Vec::with_capacity(texts.len());
        for text in texts {
            rows.push(self.encode_single(text, true)?);
        }

        if pad {
            let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
            for row in &mut rows {
                row.resize(max_len, self.pad_id);
            }
        }

        Ok(rows)
    }

    fn decode(&self, id: u32) -> Result<String> {
        self.tokenizer
            .decode(&[id], false)
            .map_err(|e| Error::Tokenizer(format!("decoding id {id} failed: {e}")))
    }

    fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    fn add_vocabulary_entries(&mut self, words: &[String]) -> Result<usize> {
        let tokens: Vec<AddedToken> = words
            .iter()
            .map(|w| AddedToken::from(w.clone(), false))
            .collect();
        self.tokenizer.add_tokens(&tokens);
        Ok(self.vocab_size())
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }

    fn keyword_id(&self, word: &str) -> Result<u32> {
        let ids = self.encode_single(word, false)?;
        match ids.as_slice() {
            [id] => Ok(*id),
            pieces => Err(Error::KeywordNotSingleToken {
                word: word.to_string(),
                pieces: pieces.len(),
            }),
        }
    }
}
