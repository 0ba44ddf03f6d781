//! Shared in-memory providers for the integration suites.
//!
//! These stand in for the tokenizer-file and checkpoint-backed providers so
//! the tests run without model weights on disk.

use candle_core::{Device, Tensor};
use contextual_embeddings::{
    Error, ResizableEmbedder, Result, SequenceEmbedder, TextEncoder,
};
use once_cell::sync::Lazy;

pub const PAD: u32 = 0;
pub const UNK: u32 = 1;
pub const CLS: u32 = 2;
pub const SEP: u32 = 3;

/// Whitespace word-level encoder over a fixed starting vocabulary.
#[derive(Debug)]
pub struct MockEncoder {
    vocab: Vec<String>,
}

impl MockEncoder {
    pub fn new(words: &[&str]) -> Self {
        let mut vocab: Vec<String> = ["[PAD]", "[UNK]", "[CLS]", "[SEP]"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        vocab.extend(words.iter().map(|s| s.to_string()));
        Self { vocab }
    }

    fn lookup(&self, word: &str) -> Option<u32> {
        self.vocab.iter().position(|w| w == word).map(|i| i as u32)
    }
}

impl TextEncoder for MockEncoder {
    fn encode_batch(&self, texts: &[String], pad: bool) -> Result<Vec<Vec<u32>>> {
        let mut rows: Vec<Vec<u32>> = texts
            .iter()
            .map(|text| {
                let mut ids = vec![CLS];
                ids.extend(
                    text.split_whitespace()
                        .map(|word| self.lookup(word).unwrap_or(UNK)),
                );
                ids.push(SEP);
                ids
            })
            .collect();

        if pad {
            let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
            for row in &mut rows {
                row.resize(max_len, PAD);
            }
        }

        Ok(rows)
    }

    fn decode(&self, id: u32) -> Result<String> {
        self.vocab
            .get(id as usize)
            .cloned()
            .ok_or(Error::IdOutOfRange {
                id,
                table_size: self.vocab.len(),
            })
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn add_vocabulary_entries(&mut self, words: &[String]) -> Result<usize> {
        for word in words {
            if self.lookup(word).is_none() {
                self.vocab.push(word.clone());
            }
        }
        Ok(self.vocab.len())
    }

    fn pad_id(&self) -> u32 {
        PAD
    }

    fn keyword_id(&self, word: &str) -> Result<u32> {
        self.lookup(word).ok_or_else(|| Error::KeywordNotSingleToken {
            word: word.to_string(),
            pieces: word.chars().count(),
        })
    }
}

/// Embedder whose output at (row, pos) is a deterministic function of the id
/// and its position, so extraction can be verified by construction.
pub struct PositionalEmbedder {
    pub table_size: usize,
    pub hidden: usize,
}

impl PositionalEmbedder {
    pub fn expected(&self, id: u32, position: usize) -> Vec<f32> {
        (0..self.hidden)
            .map(|dim| id as f32 * 100.0 + position as f32 * 10.0 + dim as f32 + 1.0)
            .collect()
    }
}

impl SequenceEmbedder for PositionalEmbedder {
    fn forward(&self, ids: &[Vec<u32>]) -> Result<Tensor> {
        let seq_len = ids.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::new();
        for (row, seq) in ids.iter().enumerate() {
            if seq.len() != seq_len {
                return Err(Error::RaggedBatch {
                    row,
                    len: seq.len(),
                    expected: seq_len,
                });
            }
            for (position, &id) in seq.iter().enumerate() {
                if id as usize >= self.table_size {
                    return Err(Error::IdOutOfRange {
                        id,
                        table_size: self.table_size,
                    });
                }
                data.extend(self.expected(id, position));
            }
        }
        let tensor =
            Tensor::from_vec(data, (ids.len(), seq_len, self.hidden), &Device::Cpu)?;
        Ok(tensor)
    }

    fn input_table_size(&self) -> usize {
        self.table_size
    }

    fn hidden_size(&self) -> usize {
        self.hidden
    }
}

impl ResizableEmbedder for PositionalEmbedder {
    fn resize_input_table(&mut self, new_size: usize) -> Result<()> {
        if new_size < self.table_size {
            return Err(Error::ShrinkInputTable {
                current: self.table_size,
                requested: new_size,
            });
        }
        self.table_size = new_size;
        Ok(())
    }
}

/// Embedder that replays a preset (B, L, D) output, for scenarios where the
/// test wants full control over the contextual vectors.
pub struct PresetEmbedder {
    pub table_size: usize,
    pub hidden: usize,
    pub outputs: Vec<Vec<Vec<f32>>>,
}

impl SequenceEmbedder for PresetEmbedder {
    fn forward(&self, ids: &[Vec<u32>]) -> Result<Tensor> {
        assert_eq!(ids.len(), self.outputs.len(), "preset batch size mismatch");
        let seq_len = ids.first().map(|r| r.len()).unwrap_or(0);
        let data: Vec<f32> = self
            .outputs
            .iter()
            .flat_map(|rows| rows.iter().flatten().copied())
            .collect();
        let tensor =
            Tensor::from_vec(data, (ids.len(), seq_len, self.hidden), &Device::Cpu)?;
        Ok(tensor)
    }

    fn input_table_size(&self) -> usize {
        self.table_size
    }

    fn hidden_size(&self) -> usize {
        self.hidden
    }
}

/// The five-sentence "pilot" scenario: two flight contexts, a training
/// context, a navy context, and the Honda Pilot.
pub static PILOT_SENTENCES: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "the pilot landed the plane".to_string(),
        "the pilot flew through the storm".to_string(),
        "the pilot finished flight training".to_string(),
        "the navy pilot saluted".to_string(),
        "she drove her honda pilot home".to_string(),
    ]
});

/// Vocabulary covering every word in [`PILOT_SENTENCES`].
pub fn pilot_vocabulary() -> Vec<&'static str> {
    vec![
        "the", "pilot", "landed", "plane", "flew", "through", "storm", "finished", "flight",
        "training", "navy", "saluted", "she", "drove", "her", "honda", "home",
    ]
}
