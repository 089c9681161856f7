//! Prompt templates for the OCR correction step
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

/// Generate a prompt asking the LLM to merge two plain-text OCR results
///
/// The model is asked to answer with `{data: <string>}`, which
/// [`crate::parsing::text_from_response`] reads back.
///
/// # Arguments
/// * `languages` - Language codes joined with `+`, e.g. `ko+en`
/// * `first` - Output of the first OCR engine, shown as `[0]`
/// * `second` - Output of the second OCR engine, shown as `[1]`
/// * `context` - Optional keywords to bias the correction
///
/// # Example
/// ```
/// use betterocr::llm::prompts::text_correction_prompt;
///
/// let prompt = text_correction_prompt("en", "He1lo", "Hello", Some("greetings"));
/// assert!(prompt.contains("[0]: He1lo"));
/// assert!(prompt.ends_with("[context]: greetings"));
/// ```
pub fn text_correction_prompt(
    languages: &str,
    first: &str,
    second: &str,
    context: Option<&str>,
) -> String {
    let context_line = context
        .map(|context| format!("[context]: {context}"))
        .unwrap_or_default();

    format!(
        r#"Combine and correct OCR results [0] and [1], using \n for line breaks. Language is in {languages}. Remove unintended noise. Refer to the [context] keywords. Answer in the JSON format {{data:<output:string>}}:
[0]: {first}
[1]: {second}
{context_line}"#
    )
    .trim()
    .to_string()
}

/// Generate a prompt asking the LLM to merge two sets of OCR boxes
///
/// Both inputs are JSON arrays of `{box, text}` records. The model is
/// asked to answer with the same shape, boxes as four corners.
///
/// # Arguments
/// * `languages` - Language codes joined with `+`
/// * `first_json` - Serialized detections of the first engine, shown as `[0]`
/// * `second_json` - Serialized detections of the second engine, shown as `[1]`
/// * `context` - Optional keywords and spellings to prefer
pub fn box_correction_prompt(
    languages: &str,
    first_json: &str,
    second_json: &str,
    context: Option<&str>,
) -> String {
    let context_instruction = if context.is_some() {
        " Please refer to the keywords and spelling in [context]"
    } else {
        ""
    };
    let context_line = context
        .map(|context| format!("[context]: {context}"))
        .unwrap_or_default();

    format!(
        r#"Combine and correct OCR data [0] and [1]. Include many items as possible. Language is in {languages} (Avoid arbitrary translations). Remove unintended noise.{context_instruction} Answer in the JSON format. Ensure coordinates are integers (round based on confidence if necessary) and output in the same JSON format (indent=0): Array({{box:[[x,y],[x+w,y],[x+w,y+h],[x,y+h]],text:str}}):
[0]: {first_json}
[1]: {second_json}
{context_line}"#
    )
    .trim()
    .to_string()
}
