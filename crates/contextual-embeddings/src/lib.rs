#![deny(clippy::all)]

//! Probe how contextual token embeddings vary by sentence context.
//!
//! The pipeline is synchronous and single-pass: encode a batch of sentences,
//! run the embedder, locate a keyword in each sequence, extract its vector,
//! and compare the vectors by cosine similarity. The encoder/embedder pairing
//! carries a size invariant (vocabulary entries == input table rows) that
//! [`ModelPair`] enforces on every forward pass.

mod embedder;
mod encoder;
mod error;
mod keyword;
mod pairing;
mod similarity;

pub use embedder::{BertSequenceEmbedder, LookupEmbedder, ResizableEmbedder, SequenceEmbedder};
pub use encoder::{HfTextEncoder, TextEncoder};
pub use error::{Error, Result};
pub use keyword::{extract_at, locate_keyword};
pub use pairing::{check_sizes, ModelPair};
pub use similarity::{
    cosine_similarity, pairwise_similarities, similarities_to_reference, SimilarityReport,
};

// Auto-initialize logging for debug builds
#[cfg(feature = "debug")]
#[ctor::ctor]
fn init_native_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Load a tokenizer/BERT pairing from a checkpoint directory.
///
/// # Expected files
/// - `config.json` - Model configuration
/// - `tokenizer.json` - Tokenizer configuration
/// - `model.safetensors` - Model weights
pub fn load_bert_pair(
    model_dir: &std::path::Path,
) -> anyhow::Result<ModelPair<HfTextEncoder, BertSequenceEmbedder>> {
    use anyhow::Context;
    use std::fs;

    let config_path = model_dir.join("config.json");
    let tokenizer_path = model_dir.join("tokenizer.json");
    let weights_path = model_dir.join("model.safetensors");

    let config_json = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let tokenizer_json = fs::read(&tokenizer_path)
        .with_context(|| format!("Failed to read {}", tokenizer_path.display()))?;
    let model_weights = fs::read(&weights_path)
        .with_context(|| format!("Failed to read {}", weights_path.display()))?;

    let encoder = HfTextEncoder::from_bytes(&tokenizer_json)?;
    let pad_id = encoder.pad_id();
    let embedder = BertSequenceEmbedder::load(&config_json, &model_weights, pad_id)?;

    ModelPair::new(encoder, embedder).context("tokenizer and checkpoint disagree on size")
}
