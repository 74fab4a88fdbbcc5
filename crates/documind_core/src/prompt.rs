//! crates/documind_core/src/prompt.rs
//!
//! Prompt text sent to the generation endpoint.

use crate::ports::PortError;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful business writing assistant. Output clean markdown.";

/// The editor's one-click rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiCommand {
    Summarize,
    Professional,
    /// Caller supplies the instruction.
    Custom,
}

impl AiCommand {
    pub fn preset_instruction(&self) -> Option<&'static str> {
        match self {
            AiCommand::Summarize => Some("Summarize this in 3 bullet points."),
            AiCommand::Professional => Some("Rewrite this to sound more professional."),
            AiCommand::Custom => None,
        }
    }

    /// Picks the instruction for this command; `Custom` requires one.
    pub fn instruction<'a>(&self, custom: Option<&'a str>) -> Result<&'a str, PortError> {
        if let Some(preset) = self.preset_instruction() {
            return Ok(preset);
        }
        custom
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .ok_or_else(|| PortError::Validation("An instruction is required".to_string()))
    }
}

/// Wraps a document's text and an instruction into a single prompt.
pub fn compose_prompt(original_text: &str, instruction: &str) -> String {
    format!(
        "Original Text:\n\"{}\"\n\nInstruction:\n{}",
        original_text, instruction
    )
}
