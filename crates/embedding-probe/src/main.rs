//! Probe a BERT checkpoint: tokenization view, contextual keyword
//! similarities, and the vocabulary-extension walkthrough.
//!
//! Usage:
//!   embedding-probe <model-dir> [keyword] [--json]
//!
//! The model directory must contain config.json, tokenizer.json, and
//! model.safetensors (a HuggingFace checkpoint layout).

use anyhow::{bail, Context, Result};
use contextual_embeddings::{
    check_sizes, load_bert_pair, HfTextEncoder, LookupEmbedder, ModelPair, SequenceEmbedder,
    SimilarityReport, TextEncoder,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Example sentences: the keyword "pilot" in flight, training, navy, and car
/// contexts.
const PILOT_SENTENCES: [&str; 5] = [
    "the pilot landed the plane safely",
    "the pilot flew through the storm",
    "the pilot finished her flight training",
    "the navy pilot saluted the captain",
    "she drove her honda pilot to work",
];

const DEFAULT_KEYWORD: &str = "pilot";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json = if let Some(pos) = args.iter().position(|a| a == "--json") {
        args.remove(pos);
        true
    } else {
        false
    };

    let model_dir = match args.first() {
        Some(dir) => PathBuf::from(dir),
        None => bail!("usage: embedding-probe <model-dir> [keyword] [--json]"),
    };
    let keyword = args.get(1).map(String::as_str).unwrap_or(DEFAULT_KEYWORD);

    tracing::info!("loading checkpoint from {}", model_dir.display());
    let pair = load_bert_pair(&model_dir)?;

    let sentences: Vec<String> = PILOT_SENTENCES.iter().map(|s| s.to_string()).collect();

    show_tokenization(pair.encoder(), &sentences[0])?;

    let report = compare_keyword(&pair, &sentences, keyword)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, keyword);
    }

    extension_walkthrough(&model_dir, pair.embedder().hidden_size())?;

    Ok(())
}

/// Per-token id/surface dump for one sentence, plus the content token count.
fn show_tokenization(encoder: &HfTextEncoder, text: &str) -> Result<()> {
    println!("Tokenization");
    println!("{}", "=".repeat(80));
    println!("Text: \"{text}\"");

    let ids = encoder.encode_single(text, true)?;
    for id in &ids {
        println!("  {id}: {}", encoder.decode(*id)?);
    }

    let content_ids = encoder.encode_single(text, false)?;
    println!("Content tokens (no sentinels): {}", content_ids.len());
    println!();
    Ok(())
}

fn compare_keyword<E, M>(
    pair: &ModelPair<E, M>,
    sentences: &[String],
    keyword: &str,
) -> Result<SimilarityReport>
where
    E: TextEncoder,
    M: SequenceEmbedder,
{
    let vectors = pair
        .keyword_embeddings(sentences, keyword)
        .with_context(|| format!("failed to extract embeddings for {keyword:?}"))?;
    let reference = pair
        .reference_embedding(keyword)
        .with_context(|| format!("failed to embed {keyword:?} in isolation"))?;

    Ok(SimilarityReport::new(
        sentences.to_vec(),
        &vectors,
        Some(&reference),
    )?)
}

fn print_report(report: &SimilarityReport, keyword: &str) {
    println!("Pairwise cosine similarity of {keyword:?} in context");
    println!("{}", "=".repeat(80));

    for (i, label) in report.labels.iter().enumerate() {
        println!("[{i}] {label}");
    }
    println!();

    print!("     ");
    for j in 0..report.labels.len() {
        print!("   [{j}]  ");
    }
    println!();
    for (i, row) in report.matrix.iter().enumerate() {
        print!("[{i}]  ");
        for sim in row {
            print!("{sim:>7.4} ");
        }
        println!();
    }

    if let Some(to_reference) = &report.to_reference {
        println!("\nSimilarity to {keyword:?} embedded in isolation:");
        for (i, sim) in to_reference.iter().enumerate() {
            println!("  [{i}] {sim:>7.4}");
        }
    }
    println!();
}

/// Demonstrate the vocabulary/input-table size contract on a bare lookup
/// table: break it deliberately, then fix it via paired mutation.
fn extension_walkthrough(model_dir: &std::path::Path, hidden_size: usize) -> Result<()> {
    println!("Vocabulary extension");
    println!("{}", "=".repeat(80));

    let tokenizer_json = std::fs::read(model_dir.join("tokenizer.json"))
        .context("Failed to read tokenizer.json")?;
    let new_words = vec!["hovercraft".to_string(), "gyrocopter".to_string()];

    // The unsupported path: mutate the tokenizer alone and watch the
    // consistency check fail.
    let mut loose_encoder = HfTextEncoder::from_bytes(&tokenizer_json)?;
    let table_size = loose_encoder.vocab_size();
    loose_encoder.add_vocabulary_entries(&new_words)?;
    match check_sizes(loose_encoder.vocab_size(), table_size) {
        Err(err) => println!("after add, before resize: {err}"),
        Ok(()) => bail!("consistency check unexpectedly passed"),
    }

    // The supported path: paired mutation through ModelPair.
    let encoder = HfTextEncoder::from_bytes(&tokenizer_json)?;
    let embedder = LookupEmbedder::new(encoder.vocab_size(), hidden_size)?;
    let mut pair = ModelPair::new(encoder, embedder)?;

    let before = pair.encoder().vocab_size();
    let after = pair.add_words_and_resize(&new_words)?;
    pair.check_consistency()?;
    println!("add_words_and_resize: {before} -> {after} rows, pairing consistent");

    // The added word embeds to a default-initialized (untrained) row.
    let vectors = pair.keyword_embeddings(&["hovercraft".to_string()], "hovercraft")?;
    println!(
        "\"hovercraft\" now embeds to a {}-dimensional untrained vector",
        vectors[0].len()
    );

    Ok(())
}
