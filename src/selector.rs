use crate::models::{Error, ModelDescriptor, Result};
use rand::seq::SliceRandom;
use rand::Rng;

pub const TEXT_GENERATION: &str = "Text Generation";
pub const TEXT_TO_IMAGE: &str = "Text-to-Image";

/// Outcome of a model choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub model: ModelDescriptor,
    /// True when the choice was made by the fallback policy rather than the user.
    pub fallback: bool,
}

pub struct ModelSelector;

impl ModelSelector {
    /// Resolve `explicit_choice` as a 1-based index into `catalog`. When it is
    /// absent or invalid, pick uniformly at random among the models whose
    /// capability equals `required_capability`.
    pub fn select<R: Rng + ?Sized>(
        catalog: &[ModelDescriptor],
        explicit_choice: Option<&str>,
        required_capability: &str,
        rng: &mut R,
    ) -> Result<Selection> {
        if let Some(model) = explicit_choice.and_then(|choice| Self::by_index(catalog, choice)) {
            return Ok(Selection {
                model: model.clone(),
                fallback: false,
            });
        }

        let capable: Vec<&ModelDescriptor> = catalog
            .iter()
            .filter(|m| m.capability == required_capability)
            .collect();

        let model = capable
            .choose(rng)
            .ok_or_else(|| Error::NoCapableModel(required_capability.to_string()))?;

        tracing::debug!(
            model = %model.name,
            candidates = capable.len(),
            "fallback model selected"
        );

        Ok(Selection {
            model: (*model).clone(),
            fallback: true,
        })
    }

    fn by_index<'a>(catalog: &'a [ModelDescriptor], choice: &str) -> Option<&'a ModelDescriptor> {
        let index = choice.trim().parse::<usize>().ok()?;
        index.checked_sub(1).and_then(|i| catalog.get(i))
    }
}
