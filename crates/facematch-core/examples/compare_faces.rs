//! Compare two face images with a MobileFaceNet ONNX model.
//!
//! ```text
//! cargo run --example compare_faces -- foto1.jpg foto2.jpg --model mobilefacenet.onnx
//! ```

use anyhow::Result;
use clap::Parser;
use facematch_core::{Config, FaceEmbedder};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compare_faces", about = "Decide whether two face images show the same person")]
struct Args {
    /// First face image
    first: PathBuf,
    /// Second face image
    second: PathBuf,
    /// ONNX embedding model (default: FACEMATCH_MODEL_PATH)
    #[arg(short, long)]
    model: Option<PathBuf>,
    /// Similarity threshold (default: FACEMATCH_SIMILARITY_THRESHOLD or 0.6)
    #[arg(short, long)]
    threshold: Option<f32>,
    /// Print the verification result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(model) = args.model {
        config.model_path = model;
    }
    let threshold = args.threshold.unwrap_or(config.similarity_threshold);

    let mut embedder = FaceEmbedder::from_config(&config)?;
    tracing::info!(
        model = %config.model_path.display(),
        layout = ?embedder.layout(),
        "model ready"
    );

    let result = embedder.compare(&args.first, &args.second, threshold)?;

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    }

    println!("Similarity: {:.4}", result.similarity);
    if result.same_person {
        println!("Same person (> {threshold})");
    } else {
        println!("Different people (<= {threshold})");
    }

    Ok(())
}
