//! Groq model allow-list.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::capabilities::ModelCapabilities;

/// Models selectable for any agent role.
///
/// This is a closed set: identifiers outside it cannot be represented, so
/// role selections never need validating after the fact.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum GroqModel {
    #[default]
    #[strum(serialize = "llama-3.1-70b-versatile")]
    #[serde(rename = "llama-3.1-70b-versatile")]
    Llama3170bVersatile,
    #[strum(serialize = "llama-3.2-90b-vision-preview")]
    #[serde(rename = "llama-3.2-90b-vision-preview")]
    Llama3290bVisionPreview,
    #[strum(serialize = "llama-3.3-70b-versatile")]
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama3370bVersatile,
    #[strum(serialize = "llama3-groq-70b-8192-tool-use-preview")]
    #[serde(rename = "llama3-groq-70b-8192-tool-use-preview")]
    Llama3Groq70bToolUse,
    #[strum(serialize = "llama3-groq-8b-8192-tool-use-preview")]
    #[serde(rename = "llama3-groq-8b-8192-tool-use-preview")]
    Llama3Groq8bToolUse,
    #[strum(serialize = "llama-3.2-11b-vision-preview")]
    #[serde(rename = "llama-3.2-11b-vision-preview")]
    Llama3211bVisionPreview,
    #[strum(serialize = "llama-3.2-3b-preview")]
    #[serde(rename = "llama-3.2-3b-preview")]
    Llama323bPreview,
}

impl GroqModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama3170bVersatile => "llama-3.1-70b-versatile",
            Self::Llama3290bVisionPreview => "llama-3.2-90b-vision-preview",
            Self::Llama3370bVersatile => "llama-3.3-70b-versatile",
            Self::Llama3Groq70bToolUse => "llama3-groq-70b-8192-tool-use-preview",
            Self::Llama3Groq8bToolUse => "llama3-groq-8b-8192-tool-use-preview",
            Self::Llama3211bVisionPreview => "llama-3.2-11b-vision-preview",
            Self::Llama323bPreview => "llama-3.2-3b-preview",
        }
    }

    /// All allow-listed models, in menu order.
    pub fn all() -> Vec<GroqModel> {
        Self::iter().collect()
    }

    /// Look up a model by its 1-based position in [`GroqModel::all`].
    pub fn from_index(index: usize) -> Option<GroqModel> {
        index.checked_sub(1).and_then(|i| Self::iter().nth(i))
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        let ctx = match self {
            Self::Llama3Groq70bToolUse | Self::Llama3Groq8bToolUse => 8_192,
            _ => 128_000,
        };
        let mut caps = ModelCapabilities::chat_with_tools(ctx);
        caps.supports_vision = matches!(
            self,
            Self::Llama3290bVisionPreview | Self::Llama3211bVisionPreview
        );
        caps.max_output_tokens = Some(8_192);
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_and_parse_agree_for_every_model() {
        for model in GroqModel::all() {
            let parsed = GroqModel::from_str(&model.to_string()).unwrap();
            assert_eq!(parsed, model);
            assert_eq!(model.as_str(), model.to_string());
        }
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert!(GroqModel::from_str("gpt-4o").is_err());
    }

    #[test]
    fn default_is_first_in_menu_order() {
        assert_eq!(GroqModel::all()[0], GroqModel::default());
        assert_eq!(GroqModel::all().len(), 7);
    }

    #[test]
    fn from_index_is_one_based() {
        assert_eq!(GroqModel::from_index(1), Some(GroqModel::Llama3170bVersatile));
        assert_eq!(GroqModel::from_index(3), Some(GroqModel::Llama3370bVersatile));
        assert_eq!(GroqModel::from_index(0), None);
        assert_eq!(GroqModel::from_index(8), None);
    }

    #[test]
    fn serde_uses_api_identifiers() {
        let json = serde_json::to_string(&GroqModel::Llama3370bVersatile).unwrap();
        assert_eq!(json, "\"llama-3.3-70b-versatile\"");
    }
}
