use crate::error::ValidationError;
use crate::models::{FormState, GenerationParameters};

/// Turns form contents into validated request parameters.
///
/// The prompt must contain something other than whitespace; it is passed on as
/// typed. An empty negative prompt and a missing seed are left unset so the
/// service applies its own defaults. A seed of zero is a real seed.
pub fn build(form: &FormState) -> Result<GenerationParameters, ValidationError> {
    if form.prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let negative_prompt = if form.negative_prompt.is_empty() {
        None
    } else {
        Some(form.negative_prompt.clone())
    };

    Ok(GenerationParameters {
        prompt: form.prompt.clone(),
        aspect_ratio: form.aspect_ratio,
        style: form.style,
        expand_prompt: form.expand_prompt,
        negative_prompt,
        seed: form.seed,
    })
}
