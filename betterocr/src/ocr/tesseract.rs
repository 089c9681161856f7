use leptess::{LepTess, Variable};
use tracing::{debug, info};

use crate::config::TesseractConfig;
use crate::error::{BetterOcrError, Result};
use crate::models::{BoundingBox, DetectOptions, Detection, TextOutput};

use super::OcrEngine;

/// Tesseract page-iterator level for single words in TSV output.
const WORD_LEVEL: u32 = 5;

#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

/// Map language codes to Tesseract traineddata names and join them.
///
/// Two-letter codes and the `ch_sim`/`ch_tra` spellings are translated;
/// anything else is assumed to already be a Tesseract name.
pub fn tesseract_languages(languages: &[String]) -> String {
    languages
        .iter()
        .map(|code| match code.as_str() {
            "en" => "eng",
            "ko" => "kor",
            "ja" => "jpn",
            "ch_sim" | "zh" | "zh-cn" => "chi_sim",
            "ch_tra" | "zh-tw" => "chi_tra",
            "fr" => "fra",
            "de" => "deu",
            "es" => "spa",
            "it" => "ita",
            "pt" => "por",
            "ru" => "rus",
            "ar" => "ara",
            "hi" => "hin",
            "th" => "tha",
            "vi" => "vie",
            "nl" => "nld",
            "pl" => "pol",
            "tr" => "tur",
            "uk" => "ukr",
            other => other,
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Parse Tesseract TSV output into word detections.
///
/// Keeps only word-level rows with a non-negative confidence and
/// non-blank text. Header and malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    tsv.lines().filter_map(parse_tsv_row).collect()
}

fn parse_tsv_row(line: &str) -> Option<Detection> {
    let columns: Vec<&str> = line.splitn(12, '\t').collect();
    if columns.len() < 12 {
        return None;
    }

    let level: u32 = columns[0].parse().ok()?;
    if level != WORD_LEVEL {
        return None;
    }

    let left: i64 = columns[6].parse().ok()?;
    let top: i64 = columns[7].parse().ok()?;
    let width: i64 = columns[8].parse().ok()?;
    let height: i64 = columns[9].parse().ok()?;
    let confidence: f32 = columns[10].parse().ok()?;
    let text = columns[11].trim();

    if confidence < 0.0 || text.is_empty() {
        return None;
    }

    Some(Detection {
        bbox: BoundingBox::from_rect(left, top, width, height),
        text: text.to_string(),
        confidence: Some(confidence),
    })
}

impl TesseractEngine {
    pub fn new(config: &TesseractConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn create_tesseract(&self, options: &DetectOptions) -> Result<LepTess> {
        let languages = tesseract_languages(&options.languages);
        let data_path = options
            .tesseract
            .data_path
            .as_deref()
            .or(self.config.data_path.as_deref());

        let mut lt = LepTess::new(data_path, &languages).map_err(|e| {
            BetterOcrError::OcrUnavailable(format!("Tesseract not available for '{languages}': {e}"))
        })?;

        if let Some(psm) = options.tesseract.page_seg_mode {
            lt.set_variable(Variable::TesseditPagesegMode, &psm.to_string())
                .map_err(|e| BetterOcrError::Ocr(format!("Invalid page segmentation mode: {e:?}")))?;
        }

        if let Some(whitelist) = &options.tesseract.char_whitelist {
            lt.set_variable(Variable::TesseditCharWhitelist, whitelist)
                .map_err(|e| BetterOcrError::Ocr(format!("Invalid character whitelist: {e:?}")))?;
        }

        let bytes = std::fs::read(&options.image_path)?;
        lt.set_image_from_mem(&bytes)
            .map_err(|e| BetterOcrError::Ocr(format!("Failed to set image: {e}")))?;

        debug!(languages = %languages, path = %options.image_path.display(), "Tesseract ready");
        Ok(lt)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize_text(&self, options: &DetectOptions) -> Result<TextOutput> {
        let mut lt = self.create_tesseract(options)?;
        let text = lt
            .get_utf8_text()
            .map_err(|e| BetterOcrError::Ocr(format!("Failed to extract text: {e}")))?;

        let text = text.trim().to_string();
        info!(chars = text.chars().count(), "Tesseract text recognized");
        Ok(TextOutput::new(text))
    }

    fn recognize_boxes(&self, options: &DetectOptions) -> Result<Vec<Detection>> {
        let mut lt = self.create_tesseract(options)?;
        let tsv = lt
            .get_tsv_text(0)
            .map_err(|e| BetterOcrError::Ocr(format!("Failed to extract boxes: {e}")))?;

        let detections = parse_tsv(&tsv);
        info!(boxes = detections.len(), "Tesseract boxes recognized");
        Ok(detections)
    }
}
