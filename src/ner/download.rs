// Model download helper for the ONNX NER model.
//
// Downloads bert-base-NER (ONNX export) from HuggingFace: the graph, the
// tokenizer, and the config carrying the label map. Files are stored in a
// platform-appropriate directory (~/.local/share/namescout/models/ on Linux)
// so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::onnx::{CONFIG_FILE, MODEL_FILE, TOKENIZER_FILE};

/// HuggingFace repo for the NER model.
const NER_HF_URL: &str = "https://huggingface.co/Xenova/bert-base-NER/resolve/main";

/// Remote path of the ONNX graph within the repo.
const NER_REMOTE_MODEL_FILE: &str = "onnx/model.onnx";

/// Name of the model subdirectory under the models root.
const NER_MODEL_NAME: &str = "bert-base-NER";

/// Returns the default directory for storing the NER model.
/// Uses the platform data directory: ~/.local/share/namescout/models/bert-base-NER on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("namescout")
        .join("models")
        .join(NER_MODEL_NAME)
}

/// Check whether all required NER model files exist.
pub fn model_files_present(dir: &Path) -> bool {
    [MODEL_FILE, TOKENIZER_FILE, CONFIG_FILE]
        .iter()
        .all(|file| dir.join(file).exists())
}

/// Download the NER model files into `dir`.
///
/// Skips files that already exist. Shows a progress bar for the model graph.
pub async fn download_model(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nNER model ({NER_MODEL_NAME}):");

    let client = reqwest::Client::new();

    for (remote, local, show_progress) in [
        (CONFIG_FILE, CONFIG_FILE, false),
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (NER_REMOTE_MODEL_FILE, MODEL_FILE, true),
    ] {
        let dest = dir.join(local);
        if dest.exists() {
            info!(file = local, "NER model file already exists, skipping");
            println!("  {local} (already exists)");
            continue;
        }

        if show_progress {
            println!("  Downloading {local} (~430 MB)...");
        } else {
            println!("  Downloading {local}...");
        }
        download_file(&client, &format!("{NER_HF_URL}/{remote}"), &dest, show_progress).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = match total_size {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .context("Invalid progress bar template")?
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .context("Invalid progress bar template")?,
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    // Stream chunks into memory so the bar advances, then write once
    let mut bytes = Vec::with_capacity(total_size.unwrap_or(0) as usize);
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
