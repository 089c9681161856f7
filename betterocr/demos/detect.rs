//! Run text or box detection on an image from the command line.
//!
//! ```sh
//! OPENAI_API_KEY=... cargo run --example detect -- demo.png --lang ko --lang en
//! cargo run --example detect -- demo.png --boxes --context "BetterOCR"
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use betterocr::{DetectOptions, Detector, LlmOptions, TesseractOptions};

#[derive(Parser)]
#[command(name = "detect")]
#[command(about = "Combine two OCR engines and correct the result with an LLM")]
struct Args {
    /// Image to read
    image: std::path::PathBuf,

    /// Language code, repeatable (e.g. --lang ko --lang en)
    #[arg(long = "lang", default_values_t = vec!["en".to_string()])]
    languages: Vec<String>,

    /// Keywords or spellings the LLM should prefer
    #[arg(long)]
    context: Option<String>,

    /// Chat-completion model
    #[arg(long, default_value = "gpt-4")]
    model: String,

    /// Tesseract page segmentation mode
    #[arg(long)]
    psm: Option<u32>,

    /// Output text boxes as JSON instead of plain text
    #[arg(long)]
    boxes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "betterocr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut options = DetectOptions::new(&args.image, args.languages)
        .with_llm(LlmOptions::new(args.model))
        .with_tesseract(TesseractOptions {
            page_seg_mode: args.psm,
            ..TesseractOptions::default()
        });
    if let Some(context) = args.context {
        options = options.with_context(context);
    }

    let detector = Detector::from_env();

    if args.boxes {
        let boxes = detector.detect_boxes(&options).await?;
        println!("{}", serde_json::to_string_pretty(&boxes)?);
    } else {
        let text = detector.detect_text(&options).await?;
        println!("{text}");
    }

    Ok(())
}
