//! Language and server selection for one episode's variants.

use crate::error::SelectionError;
use crate::locator::PlaybackLocator;
use serde::Serialize;
use shared::Variant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    NoSelection,
    LanguageSelected { language: String },
    VariantSelected { language: String, index: usize },
}

/// Variants sharing a language tag, in source order
#[derive(Debug, Clone, Serialize)]
pub struct LanguageGroup {
    pub language: String,
    pub variants: Vec<Variant>,
}

/// State machine over language → variant list → active variant
///
/// The active variant's language always equals the selected language.
#[derive(Debug, Clone, Serialize)]
pub struct ServerSelection {
    groups: Vec<LanguageGroup>,
    state: SelectionState,
    /// Pick the first variant whenever a language becomes selected
    #[serde(skip)]
    auto_select_first: bool,
}

impl Default for ServerSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerSelection {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            state: SelectionState::NoSelection,
            auto_select_first: true,
        }
    }

    /// Stop at `LanguageSelected` until a variant is picked explicitly
    pub fn manual() -> Self {
        Self {
            auto_select_first: false,
            ..Self::new()
        }
    }

    /// Replace the variant set for a newly loaded episode
    ///
    /// Groups by language in first-seen order and selects the first language.
    /// An empty set leaves the selection at `NoSelection`.
    pub fn load_variants(&mut self, variants: Vec<Variant>) -> Result<(), SelectionError> {
        self.reset();

        for variant in variants {
            match self.groups.iter_mut().find(|g| g.language == variant.language) {
                Some(group) => group.variants.push(variant),
                None => self.groups.push(LanguageGroup {
                    language: variant.language.clone(),
                    variants: vec![variant],
                }),
            }
        }

        let first = self
            .groups
            .first()
            .map(|g| g.language.clone())
            .ok_or(SelectionError::NoPlayableVariant)?;

        debug!(
            languages = self.groups.len(),
            first_language = %first,
            "Loaded episode variants"
        );

        self.enter_language(first);
        Ok(())
    }

    pub fn select_language(&mut self, language: &str) -> Result<(), SelectionError> {
        if self.group(language).is_none() {
            return Err(SelectionError::UnknownLanguage(language.to_string()));
        }
        self.enter_language(language.to_string());
        Ok(())
    }

    /// Make `variant` active; it must belong to the selected language
    pub fn select_variant(&mut self, variant: &Variant) -> Result<(), SelectionError> {
        let language = self
            .current_language()
            .ok_or(SelectionError::NoPlayableVariant)?
            .to_string();

        if variant.language != language {
            return Err(SelectionError::VariantLanguageMismatch {
                expected: language,
                found: variant.language.clone(),
            });
        }

        let index = self
            .variants_for(&language)
            .iter()
            .position(|v| v == variant)
            .ok_or_else(|| SelectionError::UnknownVariant(variant.label()))?;

        self.state = SelectionState::VariantSelected { language, index };
        Ok(())
    }

    /// Make the first variant with quality label `quality` active
    pub fn select_quality(&mut self, quality: &str) -> Result<(), SelectionError> {
        let variant = self
            .current_language()
            .and_then(|language| {
                self.variants_for(language)
                    .iter()
                    .find(|v| v.quality.eq_ignore_ascii_case(quality))
            })
            .cloned()
            .ok_or_else(|| SelectionError::UnknownVariant(quality.to_string()))?;

        self.select_variant(&variant)
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn languages(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.language.as_str()).collect()
    }

    /// Variants of `language` in source order; empty if unknown
    pub fn variants_for(&self, language: &str) -> &[Variant] {
        self.group(language).map(|g| g.variants.as_slice()).unwrap_or(&[])
    }

    pub fn current_language(&self) -> Option<&str> {
        match &self.state {
            SelectionState::NoSelection => None,
            SelectionState::LanguageSelected { language }
            | SelectionState::VariantSelected { language, .. } => Some(language),
        }
    }

    pub fn current_variant(&self) -> Option<&Variant> {
        match &self.state {
            SelectionState::VariantSelected { language, index } => self.variants_for(language).get(*index),
            _ => None,
        }
    }

    /// Locator of the active variant without network resolution
    pub fn active_locator(&self) -> Option<PlaybackLocator> {
        self.current_variant().and_then(PlaybackLocator::for_variant)
    }

    pub fn reset(&mut self) {
        self.groups.clear();
        self.state = SelectionState::NoSelection;
    }

    fn group(&self, language: &str) -> Option<&LanguageGroup> {
        self.groups.iter().find(|g| g.language == language)
    }

    fn enter_language(&mut self, language: String) {
        self.state = if self.auto_select_first {
            SelectionState::VariantSelected { language, index: 0 }
        } else {
            SelectionState::LanguageSelected { language }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::PlaybackLocatorKind;
    use shared::ChannelMessage;

    fn variant(language: &str, quality: &str) -> Variant {
        Variant {
            language: language.to_string(),
            quality: quality.to_string(),
            direct_url: None,
            channel: Some(ChannelMessage {
                channel: "chan".to_string(),
                message_id: format!("{}-{}", language, quality),
            }),
        }
    }

    fn loaded() -> ServerSelection {
        let mut selection = ServerSelection::new();
        selection
            .load_variants(vec![
                variant("EN", "720p"),
                variant("EN", "1080p"),
                variant("JP", "720p"),
            ])
            .unwrap();
        selection
    }

    #[test]
    fn test_load_selects_first_of_first_group() {
        let mut selection = loaded();

        assert_eq!(selection.languages(), vec!["EN", "JP"]);
        assert_eq!(selection.current_language(), Some("EN"));
        assert_eq!(selection.current_variant().unwrap().quality, "720p");

        selection.select_language("JP").unwrap();
        assert_eq!(selection.current_language(), Some("JP"));
        assert_eq!(selection.current_variant().unwrap().quality, "720p");
        assert_eq!(selection.current_variant().unwrap().language, "JP");
    }

    #[test]
    fn test_changing_language_resets_variant() {
        let mut selection = loaded();
        selection.select_quality("1080p").unwrap();
        assert_eq!(selection.current_variant().unwrap().quality, "1080p");

        selection.select_language("JP").unwrap();
        selection.select_language("EN").unwrap();
        assert_eq!(selection.current_variant().unwrap().quality, "720p");
    }

    #[test]
    fn test_unknown_language() {
        let mut selection = loaded();
        assert_eq!(
            selection.select_language("FR"),
            Err(SelectionError::UnknownLanguage("FR".to_string()))
        );
        assert_eq!(selection.current_language(), Some("EN"));
    }

    #[test]
    fn test_variant_language_mismatch() {
        let mut selection = loaded();
        let err = selection.select_variant(&variant("JP", "720p")).unwrap_err();
        assert_eq!(
            err,
            SelectionError::VariantLanguageMismatch {
                expected: "EN".to_string(),
                found: "JP".to_string(),
            }
        );
        assert_eq!(selection.current_variant().unwrap().language, "EN");
    }

    #[test]
    fn test_select_variant_not_in_group() {
        let mut selection = loaded();
        assert!(matches!(
            selection.select_variant(&variant("EN", "480p")),
            Err(SelectionError::UnknownVariant(_))
        ));
        assert!(matches!(
            selection.select_quality("4k"),
            Err(SelectionError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_empty_variants() {
        let mut selection = loaded();
        assert_eq!(
            selection.load_variants(Vec::new()),
            Err(SelectionError::NoPlayableVariant)
        );
        assert_eq!(selection.state(), &SelectionState::NoSelection);
        assert!(selection.languages().is_empty());
        assert!(selection.active_locator().is_none());
    }

    #[test]
    fn test_reload_resets_state() {
        let mut selection = loaded();
        selection.select_language("JP").unwrap();

        selection.load_variants(vec![variant("DE", "480p")]).unwrap();
        assert_eq!(
            selection.state(),
            &SelectionState::VariantSelected {
                language: "DE".to_string(),
                index: 0
            }
        );
        assert!(selection.variants_for("EN").is_empty());
    }

    #[test]
    fn test_manual_selection_waits_for_variant() {
        let mut selection = ServerSelection::manual();
        selection
            .load_variants(vec![variant("EN", "720p"), variant("EN", "1080p")])
            .unwrap();

        assert_eq!(
            selection.state(),
            &SelectionState::LanguageSelected {
                language: "EN".to_string()
            }
        );
        assert!(selection.current_variant().is_none());

        selection.select_variant(&variant("EN", "1080p")).unwrap();
        assert_eq!(selection.current_variant().unwrap().quality, "1080p");
    }

    #[test]
    fn test_active_locator_kind() {
        let mut selection = ServerSelection::new();
        let mut direct = variant("EN", "1080p");
        direct.direct_url = Some("https://cdn/1080.mp4".to_string());
        selection
            .load_variants(vec![variant("EN", "720p"), direct.clone()])
            .unwrap();

        assert_eq!(
            selection.active_locator().unwrap().kind(),
            PlaybackLocatorKind::ChannelMessageLink
        );

        selection.select_variant(&direct).unwrap();
        assert_eq!(
            selection.active_locator().unwrap().kind(),
            PlaybackLocatorKind::DirectUrl
        );
    }
}
