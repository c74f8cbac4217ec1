// Local ONNX named-entity recognizer using a BERT token-classification model.
//
// Model: bert-base-NER (CoNLL-2003 labels: PER, ORG, LOC, MISC in BIO form).
// The model sees at most 512 tokens, so long pages are cut into windows and
// run as padded batches of at most MAX_WINDOWS_PER_RUN windows. Each token
// gets its arg-max tag, and the tag sequence is decoded back into character
// spans of the original text.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::{EntityLabel, EntityRecognizer, EntitySpan};

/// Tokens per window, leaving room for [CLS] and [SEP] in the 512 limit.
const WINDOW_TOKENS: usize = 510;

/// Windows per inference call. Bounds peak memory on very long pages.
const MAX_WINDOWS_PER_RUN: usize = 8;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// The subset of the HuggingFace model config we need.
#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// Special token ids for the BERT vocabulary in use.
#[derive(Debug, Clone, Copy)]
struct SpecialTokens {
    cls: i64,
    sep: i64,
    pad: i64,
}

/// Local ONNX-based recognizer. Session and tokenizer sit behind Arc so
/// inference can move to spawn_blocking; the session needs &mut to run.
pub struct OnnxEntityRecognizer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
    special: SpecialTokens,
}

impl OnnxEntityRecognizer {
    /// Load the model, tokenizer and label map from `model_dir`.
    ///
    /// Call `download::download_model()` first if the files are missing.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let config_path = model_dir.join(CONFIG_FILE);

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                anyhow::bail!(
                    "NER model file not found: {}\nRun `namescout download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        // Windowing is done here, so the tokenizer must hand back every token
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("Failed to disable truncation: {}", e))?;
        tokenizer.with_padding(None);

        let special = SpecialTokens {
            cls: special_token_id(&tokenizer, "[CLS]")?,
            sep: special_token_id(&tokenizer, "[SEP]")?,
            pad: special_token_id(&tokenizer, "[PAD]")?,
        };

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let labels = parse_label_map(&config_json)?;

        debug!(
            labels = labels.len(),
            "Loaded ONNX NER model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
            special,
        })
    }
}

#[async_trait]
impl EntityRecognizer for OnnxEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let special = self.special;
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            recognize_sync(&session, &tokenizer, &labels, special, &text)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Synchronous recognition: tokenize, window, infer, decode.
fn recognize_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    labels: &[String],
    special: SpecialTokens,
    text: &str,
) -> Result<Vec<EntitySpan>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let ids = encoding.get_ids();
    let offsets = encoding.get_offsets();
    let word_ids = encoding.get_word_ids();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let windows = token_windows(ids.len(), WINDOW_TOKENS);
    let mut tagged = Vec::with_capacity(ids.len());

    for group in windows.chunks(MAX_WINDOWS_PER_RUN) {
        let (logits, max_len) = run_group(session, ids, group, special)?;
        tagged.extend(tag_group(group, &logits, max_len, labels, offsets, word_ids)?);
    }

    let spans = decode_bio(&tagged, text);

    debug!(
        tokens = ids.len(),
        windows = windows.len(),
        spans = spans.len(),
        text_preview = %crate::output::truncate_chars(text, 50),
        "ONNX recognized entities"
    );

    Ok(spans)
}

/// Run one batch of windows through the model.
///
/// Returns the flat logits `[group, max_len, num_labels]` and `max_len`.
fn run_group(
    session: &Arc<Mutex<Session>>,
    ids: &[u32],
    group: &[Range<usize>],
    special: SpecialTokens,
) -> Result<(Vec<f32>, usize)> {
    let batch_size = group.len();
    let max_len = group.iter().map(|w| w.len()).max().unwrap_or(0) + 2;

    // BERT inputs: [CLS] tokens [SEP], right-padded with [PAD].
    // token_type_ids are all zero for single-sequence input.
    let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

    for window in group {
        input_ids_flat.push(special.cls);
        input_ids_flat.extend(ids[window.clone()].iter().map(|&id| id as i64));
        input_ids_flat.push(special.sep);

        let seq_len = window.len() + 2;
        attention_mask_flat.extend(std::iter::repeat_n(1i64, seq_len));

        let pad_len = max_len - seq_len;
        input_ids_flat.extend(std::iter::repeat_n(special.pad, pad_len));
        attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
    }
    let token_type_ids_flat = vec![0i64; batch_size * max_len];

    let shape = [batch_size as i64, max_len as i64];

    let input_ids_tensor =
        Tensor::from_array((shape, input_ids_flat)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
        .context("Failed to create token_type_ids tensor")?;

    let mut session = session
        .lock()
        .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

    let outputs = session
        .run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor
        })
        .context("NER ONNX inference failed")?;

    let (_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .context("Failed to extract logits tensor")?;

    Ok((data.to_vec(), max_len))
}

/// Map one group's logits back onto the source tokens, in token order.
fn tag_group<'a>(
    group: &[Range<usize>],
    logits: &[f32],
    max_len: usize,
    labels: &'a [String],
    offsets: &[(usize, usize)],
    word_ids: &[Option<u32>],
) -> Result<Vec<TaggedToken<'a>>> {
    let num_labels = labels.len();
    if logits.len() != group.len() * max_len * num_labels {
        anyhow::bail!(
            "Unexpected logits size {} for batch {}x{} with {} labels",
            logits.len(),
            group.len(),
            max_len,
            num_labels
        );
    }

    let mut tagged = Vec::with_capacity(group.iter().map(|w| w.len()).sum());
    for (w, window) in group.iter().enumerate() {
        for (j, token_idx) in window.clone().enumerate() {
            // +1 skips the [CLS] position
            let offset = (w * max_len + j + 1) * num_labels;
            let label_id = argmax(&logits[offset..offset + num_labels]);
            let (start, end) = offsets[token_idx];
            tagged.push(TaggedToken {
                tag: labels[label_id].as_str(),
                start,
                end,
                word: word_ids[token_idx],
            });
        }
    }

    Ok(tagged)
}

fn special_token_id(tokenizer: &Tokenizer, token: &str) -> Result<i64> {
    tokenizer
        .token_to_id(token)
        .map(i64::from)
        .ok_or_else(|| anyhow::anyhow!("Tokenizer has no {} token", token))
}

/// Turn the config's `id2label` object into a vector indexed by label id.
fn parse_label_map(config_json: &str) -> Result<Vec<String>> {
    let config: ModelConfig =
        serde_json::from_str(config_json).context("Failed to parse model config")?;

    if config.id2label.is_empty() {
        anyhow::bail!("Model config has an empty id2label map");
    }

    let mut labels = vec![String::new(); config.id2label.len()];
    for (id, label) in config.id2label {
        let idx: usize = id
            .parse()
            .with_context(|| format!("Non-numeric label id in model config: {id}"))?;
        let slot = labels
            .get_mut(idx)
            .ok_or_else(|| anyhow::anyhow!("Label id {idx} out of range in model config"))?;
        *slot = label;
    }

    Ok(labels)
}

/// Split `len` tokens into consecutive windows of at most `size`.
fn token_windows(len: usize, size: usize) -> Vec<Range<usize>> {
    (0..len)
        .step_by(size.max(1))
        .map(|start| start..(start + size).min(len))
        .collect()
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

/// One token with its predicted tag and byte offsets into the source text.
#[derive(Debug, Clone, Copy)]
struct TaggedToken<'a> {
    tag: &'a str,
    start: usize,
    end: usize,
    word: Option<u32>,
}

/// A span being built while walking the tag sequence.
struct OpenSpan<'a> {
    kind: &'a str,
    start: usize,
    end: usize,
    word: Option<u32>,
}

/// Split `B-PER` into (`B`, `PER`). `O` and malformed tags yield None.
fn split_tag(tag: &str) -> Option<(&str, &str)> {
    tag.split_once('-')
}

/// Decode a BIO tag sequence into entity spans.
///
/// Word-piece continuations of the word that last extended an open span
/// join that span whatever their own tag, since the model only labels the
/// first piece reliably.
fn decode_bio(tokens: &[TaggedToken<'_>], text: &str) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut open: Option<OpenSpan<'_>> = None;

    for tok in tokens {
        if let Some(current) = open.as_mut() {
            if tok.word.is_some() && tok.word == current.word {
                current.end = tok.end;
                continue;
            }
        }

        match split_tag(tok.tag) {
            Some(("I", kind)) if open.as_ref().is_some_and(|o| o.kind == kind) => {
                if let Some(current) = open.as_mut() {
                    current.end = tok.end;
                    current.word = tok.word;
                }
            }
            Some(("B" | "I", kind)) => {
                close_span(open.take(), text, &mut spans);
                open = Some(OpenSpan {
                    kind,
                    start: tok.start,
                    end: tok.end,
                    word: tok.word,
                });
            }
            _ => close_span(open.take(), text, &mut spans),
        }
    }
    close_span(open, text, &mut spans);

    spans
}

fn close_span(open: Option<OpenSpan<'_>>, text: &str, spans: &mut Vec<EntitySpan>) {
    let Some(span) = open else {
        return;
    };
    if let Some(surface) = text.get(span.start..span.end) {
        spans.push(EntitySpan::new(surface, EntityLabel::from_tag_kind(span.kind)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build tagged tokens over `text` from (word, tag, word_id) triples,
    /// locating each piece after the previous one.
    fn tokens<'a>(text: &str, pieces: &[(&str, &'a str, u32)]) -> Vec<TaggedToken<'a>> {
        let mut cursor = 0;
        pieces
            .iter()
            .map(|(piece, tag, word)| {
                let start = cursor + text[cursor..].find(*piece).unwrap();
                let end = start + piece.len();
                cursor = end;
                TaggedToken {
                    tag: *tag,
                    start,
                    end,
                    word: Some(*word),
                }
            })
            .collect()
    }

    #[test]
    fn test_decode_merges_b_and_i() {
        let text = "Minister Miri Regev said";
        let toks = tokens(
            text,
            &[("Minister", "O", 0), ("Miri", "B-PER", 1), ("Regev", "I-PER", 2), ("said", "O", 3)],
        );
        let spans = decode_bio(&toks, text);
        assert_eq!(spans, vec![EntitySpan::new("Miri Regev", EntityLabel::Person)]);
    }

    #[test]
    fn test_decode_splits_on_o() {
        let text = "Regev and Netanyahu";
        let toks = tokens(
            text,
            &[("Regev", "B-PER", 0), ("and", "O", 1), ("Netanyahu", "B-PER", 2)],
        );
        let spans = decode_bio(&toks, text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Regev");
        assert_eq!(spans[1].text, "Netanyahu");
    }

    #[test]
    fn test_decode_b_after_b_starts_new_span() {
        let text = "Regev Netanyahu";
        let toks = tokens(text, &[("Regev", "B-PER", 0), ("Netanyahu", "B-PER", 1)]);
        let spans = decode_bio(&toks, text);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_decode_type_change_splits() {
        let text = "Regev Knesset";
        let toks = tokens(text, &[("Regev", "B-PER", 0), ("Knesset", "I-ORG", 1)]);
        let spans = decode_bio(&toks, text);
        assert_eq!(
            spans,
            vec![
                EntitySpan::new("Regev", EntityLabel::Person),
                EntitySpan::new("Knesset", EntityLabel::Organization),
            ]
        );
    }

    #[test]
    fn test_decode_word_piece_continuation_extends_span() {
        // "Netanyahu" split into pieces; the trailing piece is tagged O
        let text = "Netanyahu spoke";
        let toks = tokens(
            text,
            &[("Net", "B-PER", 0), ("any", "I-PER", 0), ("ahu", "O", 0), ("spoke", "O", 1)],
        );
        let spans = decode_bio(&toks, text);
        assert_eq!(spans, vec![EntitySpan::new("Netanyahu", EntityLabel::Person)]);
    }

    #[test]
    fn test_decode_leading_i_starts_span() {
        let text = "Regev spoke";
        let toks = tokens(text, &[("Regev", "I-PER", 0), ("spoke", "O", 1)]);
        let spans = decode_bio(&toks, text);
        assert_eq!(spans, vec![EntitySpan::new("Regev", EntityLabel::Person)]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_bio(&[], "").is_empty());
    }

    #[test]
    fn test_parse_label_map_orders_by_id() {
        let json = r#"{"id2label": {"0": "O", "2": "I-MISC", "1": "B-MISC"}, "other": 1}"#;
        let labels = parse_label_map(json).unwrap();
        assert_eq!(labels, vec!["O", "B-MISC", "I-MISC"]);
    }

    #[test]
    fn test_parse_label_map_rejects_gaps() {
        let json = r#"{"id2label": {"0": "O", "5": "B-PER"}}"#;
        assert!(parse_label_map(json).is_err());
    }

    #[test]
    fn test_token_windows_exact_and_remainder() {
        assert_eq!(token_windows(4, 2), vec![0..2, 2..4]);
        assert_eq!(token_windows(5, 2), vec![0..2, 2..4, 4..5]);
        assert_eq!(token_windows(1, 510), vec![0..1]);
        assert!(token_windows(0, 510).is_empty());
    }

    /// Fake logits for a group: odd token indices score B-PER, even ones O.
    /// Special and padding positions score B-PER strongly, so any shift in
    /// the position mapping shows up as a wrong tag.
    fn fake_logits(group: &[Range<usize>], max_len: usize) -> Vec<f32> {
        let mut logits = Vec::new();
        for window in group {
            for pos in 0..max_len {
                let row = if pos >= 1 && pos <= window.len() {
                    let token_idx = window.start + pos - 1;
                    if token_idx % 2 == 1 {
                        [0.0, 1.0]
                    } else {
                        [1.0, 0.0]
                    }
                } else {
                    [0.0, 5.0]
                };
                logits.extend(row);
            }
        }
        logits
    }

    #[test]
    fn test_grouped_windows_keep_token_alignment() {
        let labels = vec!["O".to_string(), "B-PER".to_string()];
        let len = 7;
        let offsets: Vec<(usize, usize)> = (0..len).map(|i| (i * 10, i * 10 + 5)).collect();
        let word_ids: Vec<Option<u32>> = (0..len as u32).map(Some).collect();
        let windows = token_windows(len, 3);

        for per_run in [1, 2, 3] {
            let mut tagged = Vec::new();
            for group in windows.chunks(per_run) {
                let max_len = group.iter().map(|w| w.len()).max().unwrap() + 2;
                let logits = fake_logits(group, max_len);
                tagged.extend(
                    tag_group(group, &logits, max_len, &labels, &offsets, &word_ids).unwrap(),
                );
            }

            assert_eq!(tagged.len(), len, "per_run {per_run}");
            for (i, tok) in tagged.iter().enumerate() {
                let expected = if i % 2 == 1 { "B-PER" } else { "O" };
                assert_eq!(tok.tag, expected, "token {i}, per_run {per_run}");
                assert_eq!((tok.start, tok.end), offsets[i]);
                assert_eq!(tok.word, Some(i as u32));
            }
        }
    }

    #[test]
    fn test_tag_group_rejects_wrong_logits_size() {
        let labels = vec!["O".to_string(), "B-PER".to_string()];
        let group = [0..2];
        let result = tag_group(&group, &[0.0; 5], 4, &labels, &[(0, 1), (2, 3)], &[Some(0), Some(1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_long_page_splits_into_bounded_groups() {
        let windows = token_windows(100_000, WINDOW_TOKENS);
        let groups: Vec<_> = windows.chunks(MAX_WINDOWS_PER_RUN).collect();
        assert_eq!(windows.len(), 197);
        assert!(groups.iter().all(|g| g.len() <= MAX_WINDOWS_PER_RUN));
        let flattened: Vec<usize> = groups.iter().flat_map(|g| g.iter().cloned().flatten()).collect();
        assert_eq!(flattened, (0..100_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_argmax_picks_highest() {
        assert_eq!(argmax(&[0.1, 2.5, -1.0, 2.4]), 1);
    }
}
