//! Dual-engine OCR with LLM correction
//!
//! Both OCR engines run side by side on tokio's blocking pool, their
//! outputs are embedded in one correction prompt, and the LLM's JSON reply
//! is parsed back into text or normalized boxes.
//!
//! A failing or panicking engine fails the whole call with that engine's
//! error, and the concurrent run is bounded by `Config::timeout_secs`.
//! On timeout the blocking workers are left to finish in the background.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{BetterOcrError, Result};
use crate::llm::{prompts, LlmClient};
use crate::models::{DetectOptions, TextBox};
use crate::ocr::{NeuralEngine, OcrEngine, TesseractEngine};
use crate::parsing::{boxes_from_response, text_from_response};

#[derive(Clone)]
pub struct Detector {
    engines: [Arc<dyn OcrEngine>; 2],
    llm: LlmClient,
    timeout: Duration,
}

impl Detector {
    /// `ocrs` as engine `[0]`, Tesseract as engine `[1]`.
    pub fn new(config: &Config) -> Self {
        Self::with_engines(
            Arc::new(NeuralEngine::new(&config.neural)),
            Arc::new(TesseractEngine::new(&config.tesseract)),
            config,
        )
    }

    pub fn from_env() -> Self {
        Self::new(&Config::from_env())
    }

    pub fn with_engines(
        first: Arc<dyn OcrEngine>,
        second: Arc<dyn OcrEngine>,
        config: &Config,
    ) -> Self {
        Self {
            engines: [first, second],
            llm: LlmClient::new(&config.llm),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recognize the image text with both engines and return the
    /// LLM-corrected combination.
    pub async fn detect_text(&self, options: &DetectOptions) -> Result<String> {
        let (first, second) = self
            .run_engines(options, |engine, options| engine.recognize_text(options))
            .await?;

        let prompt = prompts::text_correction_prompt(
            &options.joined_languages(),
            &first.prompt_repr(),
            &second.prompt_repr(),
            options.context(),
        );
        debug!(%prompt, "Text correction prompt built");

        let output = self.llm.complete(&prompt, &options.llm).await?;
        text_from_response(&output)
    }

    /// Recognize text regions with both engines and return the LLM-merged
    /// boxes, each normalized to four corners.
    pub async fn detect_boxes(&self, options: &DetectOptions) -> Result<Vec<TextBox>> {
        let (first, second) = self
            .run_engines(options, |engine, options| engine.recognize_boxes(options))
            .await?;

        let prompt = prompts::box_correction_prompt(
            &options.joined_languages(),
            &serde_json::to_string(&first)?,
            &serde_json::to_string(&second)?,
            options.context(),
        );
        debug!(%prompt, "Box correction prompt built");

        let output = self.llm.complete(&prompt, &options.llm).await?;
        let boxes = boxes_from_response(&output)?;
        info!(boxes = boxes.len(), "Boxes detected");
        Ok(boxes)
    }

    /// Run `job` on both engines concurrently; results stay in engine order.
    async fn run_engines<T, F>(&self, options: &DetectOptions, job: F) -> Result<(T, T)>
    where
        T: Send + 'static,
        F: Fn(&dyn OcrEngine, &DetectOptions) -> Result<T> + Copy + Send + 'static,
    {
        let spawn = |engine: &Arc<dyn OcrEngine>| {
            let engine = Arc::clone(engine);
            let options = options.clone();
            tokio::task::spawn_blocking(move || {
                info!(engine = engine.name(), "OCR job started");
                let result = job(engine.as_ref(), &options);
                info!(engine = engine.name(), ok = result.is_ok(), "OCR job finished");
                result
            })
        };

        let first = spawn(&self.engines[0]);
        let second = spawn(&self.engines[1]);

        let joined = tokio::time::timeout(self.timeout, async {
            tokio::try_join!(join_worker(first), join_worker(second))
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(_) => Err(BetterOcrError::Timeout {
                timeout: self.timeout,
            }),
        }
    }
}

async fn join_worker<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|e| BetterOcrError::Internal(format!("OCR worker panicked: {e}")))?
}

/// [`Detector::detect_text`] with configuration read from the environment.
pub async fn detect_text(options: &DetectOptions) -> Result<String> {
    Detector::from_env().detect_text(options).await
}

/// [`Detector::detect_boxes`] with configuration read from the environment.
pub async fn detect_boxes(options: &DetectOptions) -> Result<Vec<TextBox>> {
    Detector::from_env().detect_boxes(options).await
}

/// Combined text-and-box detection. Not implemented.
pub fn detect(_options: &DetectOptions) -> Result<Vec<TextBox>> {
    Err(BetterOcrError::Unimplemented("detect"))
}

/// Synchronous entry points for callers without a tokio runtime.
pub mod blocking {
    use std::future::Future;

    use tokio::runtime::Builder;

    use crate::error::Result;
    use crate::models::{DetectOptions, TextBox};

    /// Drive `future` on a fresh current-thread runtime.
    ///
    /// The runtime is shut down without waiting for its blocking pool, so an
    /// engine still running after a timeout does not hold up the caller.
    pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let output = runtime.block_on(future);
        runtime.shutdown_background();
        Ok(output)
    }

    pub fn detect_text(options: &DetectOptions) -> Result<String> {
        block_on(super::detect_text(options))?
    }

    pub fn detect_boxes(options: &DetectOptions) -> Result<Vec<TextBox>> {
        block_on(super::detect_boxes(options))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::models::{Detection, TextOutput};

    /// Engine that sleeps before returning nothing.
    struct SlowEngine(Duration);

    impl OcrEngine for SlowEngine {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn recognize_text(&self, _options: &DetectOptions) -> Result<TextOutput> {
            std::thread::sleep(self.0);
            Ok(TextOutput::default())
        }

        fn recognize_boxes(&self, _options: &DetectOptions) -> Result<Vec<Detection>> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }
    }

    fn slow_detector(stall: Duration, timeout: Duration) -> Detector {
        Detector::with_engines(
            Arc::new(SlowEngine(stall)),
            Arc::new(SlowEngine(Duration::ZERO)),
            &Config::default(),
        )
        .with_timeout(timeout)
    }

    #[test]
    fn test_blocking_call_returns_at_timeout_despite_stalled_engine() {
        let detector = slow_detector(Duration::from_secs(3), Duration::from_millis(100));
        let options = DetectOptions::new("demo.png", ["en"]);

        let started = Instant::now();
        let result = blocking::block_on(detector.detect_text(&options)).unwrap();
        let elapsed = started.elapsed();

        assert!(
            matches!(result, Err(BetterOcrError::Timeout { timeout }) if timeout == Duration::from_millis(100)),
            "Expected Timeout, got: {result:?}"
        );
        assert!(elapsed < Duration::from_secs(2), "Blocking call took {elapsed:?}");
    }

    #[test]
    fn test_blocking_boxes_returns_at_timeout_despite_stalled_engine() {
        let detector = slow_detector(Duration::from_secs(3), Duration::from_millis(100));
        let options = DetectOptions::new("demo.png", ["en"]);

        let started = Instant::now();
        let result = blocking::block_on(detector.detect_boxes(&options)).unwrap();

        assert!(matches!(result, Err(BetterOcrError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_detect_is_unimplemented() {
        let options = DetectOptions::new("demo.png", ["en"]);
        assert!(matches!(
            detect(&options),
            Err(BetterOcrError::Unimplemented("detect"))
        ));
    }
}
