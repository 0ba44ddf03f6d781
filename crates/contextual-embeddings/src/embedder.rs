//! Sequence embedding seam: token ids in, per-token vectors out.

use crate::error::{Error, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};

/// Maps a batch of equal-length token-id sequences to a (B, L, D) tensor of
/// per-token vectors, where D is fixed by the provider.
pub trait SequenceEmbedder {
    /// Run a forward pass over a padded batch.
    ///
    /// All rows must share one length. Any id at or beyond
    /// [`input_table_size`](SequenceEmbedder::input_table_size) fails with
    /// [`Error::IdOutOfRange`] before the lookup, never silently.
    fn forward(&self, ids: &[Vec<u32>]) -> Result<Tensor>;

    /// Row count of the input embedding table.
    fn input_table_size(&self) -> usize;

    /// Width D of the output vectors.
    fn hidden_size(&self) -> usize;
}

/// A `SequenceEmbedder` whose input table can grow to follow vocabulary
/// extension. New rows are default-initialized (untrained, random), matching
/// what pretrained-model providers do on resize.
pub trait ResizableEmbedder: SequenceEmbedder {
    /// Grow the input table to `new_size` rows. Shrinking is rejected.
    fn resize_input_table(&mut self, new_size: usize) -> Result<()>;
}

/// Validate that every row has the same length and every id fits the table.
fn check_batch(ids: &[Vec<u32>], table_size: usize) -> Result<usize> {
    let expected = ids.first().map(|r| r.len()).unwrap_or(0);
    for (row, seq) in ids.iter().enumerate() {
        if seq.len() != expected {
            return Err(Error::RaggedBatch {
                row,
                len: seq.len(),
                expected,
            });
        }
        for &id in seq {
            if id as usize >= table_size {
                return Err(Error::IdOutOfRange { id, table_size });
            }
        }
    }
    Ok(expected)
}

/// Contextual embedder: the hidden states of a pretrained BERT model.
///
/// The output at each position depends on the whole sequence, which is what
/// makes the keyword comparison interesting. Not resizable: candle's
/// `BertModel` owns its embedding tables privately, so vocabulary-extension
/// experiments use [`LookupEmbedder`] instead.
pub struct BertSequenceEmbedder {
    model: BertModel,
    device: Device,
    vocab_size: usize,
    hidden_size: usize,
    pad_id: u32,
}

impl BertSequenceEmbedder {
    /// Load from a config.json string and safetensors weight bytes, the same
    /// file pair a HuggingFace checkpoint directory provides.
    pub fn load(config_json: &str, model_weights: &[u8], pad_id: u32) -> Result<Self> {
        // CPU is enough for single-batch analysis passes.
        let device = Device::Cpu;

        let config: Config = serde_json::from_str(config_json)?;
        let vocab_size = config.vocab_size;
        let hidden_size = config.hidden_size;

        let vb =
            VarBuilder::from_buffered_safetensors(model_weights.to_vec(), DType::F32, &device)?;
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            device,
            vocab_size,
            hidden_size,
            pad_id,
        })
    }
}

impl SequenceEmbedder for BertSequenceEmbedder {
    fn forward(&self, ids: &[Vec<u32>]) -> Result<Tensor> {
        check_batch(ids, self.vocab_size)?;

        // Attention mask marks real tokens as 1, padding as 0. Kept U32
        // because BertModel converts to F32 internally and some intermediate
        // operations require integer dtype.
        let masks: Vec<Vec<u32>> = ids
            .iter()
            .map(|row| row.iter().map(|&id| u32::from(id != self.pad_id)).collect())
            .collect();

        let token_ids = Tensor::new(ids.to_vec(), &self.device)?;
        let attention_mask = Tensor::new(masks, &self.device)?;

        // All-zero token type ids: single-segment input.
        let token_type_ids = token_ids.zeros_like()?;
        let output = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        #[cfg(feature = "debug")]
        log::debug!(
            "BERT forward: output shape {:?} [batch, seq_len, hidden_dim]",
            output.shape().dims()
        );

        Ok(output)
    }

    fn input_table_size(&self) -> usize {
        self.vocab_size
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

/// Context-free embedder: a bare (V, D) lookup table.
///
/// This is the "input embedding table" view of a model, used to examine how a
/// tokenizer's vocabulary lines up with the table when entries are added.
#[derive(Debug)]
pub struct LookupEmbedder {
    table: Tensor,
    device: Device,
}

impl LookupEmbedder {
    /// Standard deviation for freshly added rows, matching BERT's initializer.
    const INIT_STD: f32 = 0.02;

    /// Create a table of `table_size` random D-dimensional rows.
    pub fn new(table_size: usize, hidden_size: usize) -> Result<Self> {
        let device = Device::Cpu;
        let table = Tensor::randn(0f32, Self::INIT_STD, (table_size, hidden_size), &device)?;
        Ok(Self { table, device })
    }

    /// Wrap an existing (V, D) table, e.g. one sliced out of a checkpoint.
    pub fn from_table(table: Tensor) -> Result<Self> {
        table.dims2()?;
        let device = table.device().clone();
        Ok(Self { table, device })
    }

    /// Read back a single row, for inspecting what resize initialized.
    pub fn row(&self, id: u32) -> Result<Vec<f32>> {
        let table_size = self.input_table_size();
        if id as usize >= table_size {
            return Err(Error::IdOutOfRange { id, table_size });
        }
        Ok(self.table.get(id as usize)?.to_vec1::<f32>()?)
    }
}

impl SequenceEmbedder for LookupEmbedder {
    fn forward(&self, ids: &[Vec<u32>]) -> Result<Tensor> {
        check_batch(ids, self.input_table_size())?;

        let mut rows = Vec::with_capacity(ids.len());
        for seq in ids {
            let index = Tensor::new(seq.as_slice(), &self.device)?;
            rows.push(self.table.index_select(&index, 0)?);
        }

        Ok(Tensor::stack(&rows, 0)?)
    }

    fn input_table_size(&self) -> usize {
        self.table.dims()[0]
    }

    fn hidden_size(&self) -> usize {
        self.table.dims()[1]
    }
}

impl ResizableEmbedder for LookupEmbedder {
    fn resize_input_table(&mut self, new_size: usize) -> Result<()> {
        let current = self.input_table_size();
        if new_size < current {
            return Err(Error::ShrinkInputTable {
                current,
                requested: new_size,
            });
        }
        if new_size == current {
            return Ok(());
        }

        let added = Tensor::randn(
            0f32,
            Self::INIT_STD,
            (new_size - current, self.hidden_size()),
            &self.device,
        )?;
        self.table = Tensor::cat(&[&self.table, &added], 0)?;

        #[cfg(feature = "debug")]
        log::debug!("input table resized: {current} -> {new_size} rows");

        Ok(())
    }
}
