//! The card catalog: every card template a game can use.
//!
//! A catalog is built once, validated as a whole, and then only read.
//! Share it between games with an `Arc<Catalog>`; nothing in the engine
//! ever mutates it.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::cards::{Age, CardCategory, CardTemplate};
use crate::data::{CardData, DEFAULT_BUILDING_WORKERS};
use crate::error::{GameError, Result};

/// Errors raised while building a catalog. All of them are fatal.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The RON document could not be parsed, including entries missing a
    /// required field.
    #[error("Failed to parse card catalog: {source}")]
    ParseError {
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// An entry parsed but is not a valid card.
    #[error("Invalid card '{card}': {reason}")]
    InvalidEntry {
        /// Card name as written.
        card: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two entries share a name.
    #[error("Duplicate card name in catalog: {0}")]
    DuplicateCard(String),
}

/// Result type alias for catalog construction.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Immutable table of card templates keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    cards: BTreeMap<String, CardTemplate>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a RON list of [`CardData`] entries.
    ///
    /// # Errors
    ///
    /// Any malformed entry aborts the whole load.
    pub fn from_ron_str(source: &str) -> CatalogResult<Self> {
        let entries: Vec<CardData> =
            ron::from_str(source).map_err(|source| CatalogError::ParseError { source })?;
        Self::from_data(entries)
    }

    /// Validate data entries into templates.
    ///
    /// # Errors
    ///
    /// Any invalid or duplicate entry aborts the whole load.
    pub fn from_data(entries: Vec<CardData>) -> CatalogResult<Self> {
        entries
            .into_iter()
            .map(template_from_data)
            .collect::<CatalogResult<Vec<_>>>()
            .and_then(Self::from_templates)
    }

    /// Build a catalog from ready-made templates.
    ///
    /// # Errors
    ///
    /// Any invalid or duplicate template aborts the whole load.
    pub fn from_templates(templates: Vec<CardTemplate>) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        for template in templates {
            validate_template(&template)?;
            if catalog.cards.contains_key(&template.name) {
                return Err(CatalogError::DuplicateCard(template.name));
            }
            catalog.cards.insert(template.name.clone(), template);
        }

        tracing::debug!(cards = catalog.len(), "Card catalog loaded");
        Ok(catalog)
    }

    /// Look up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CardTemplate> {
        self.cards.get(name)
    }

    /// Look up a template by name, failing with [`GameError::CardNotFound`].
    pub fn resolve(&self, name: &str) -> Result<&CardTemplate> {
        self.get(name)
            .ok_or_else(|| GameError::CardNotFound(name.to_string()))
    }

    /// Check if a template exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(name)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All templates sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &CardTemplate> {
        self.cards.values()
    }

    /// Templates of one category, sorted by name.
    pub fn by_category(&self, category: CardCategory) -> impl Iterator<Item = &CardTemplate> {
        self.iter().filter(move |card| card.category == category)
    }

    /// Templates playable in `age` (that age or earlier), sorted by name.
    pub fn available_in(&self, age: Age) -> impl Iterator<Item = &CardTemplate> {
        self.iter().filter(move |card| card.age <= age)
    }
}

fn invalid(card: &str, reason: &str) -> CatalogError {
    CatalogError::InvalidEntry {
        card: card.to_string(),
        reason: reason.to_string(),
    }
}

fn template_from_data(data: CardData) -> CatalogResult<CardTemplate> {
    let max_workers = match (data.category.is_building(), data.max_workers) {
        (true, Some(max_workers)) => max_workers,
        (true, None) => DEFAULT_BUILDING_WORKERS,
        (false, None | Some(0)) => 0,
        (false, Some(_)) => {
            return Err(invalid(&data.name, "only buildings have worker slots"));
        }
    };

    Ok(CardTemplate {
        name: data.name,
        category: data.category,
        age: data.age,
        tech_cost: data.tech_cost,
        build_cost: data.build_cost,
        production: data.production,
        gain: data.gain,
        max_workers,
        victory_points: data.victory_points,
        action_bonus: data.action_bonus,
    })
}

fn validate_template(template: &CardTemplate) -> CatalogResult<()> {
    let name = template.name.as_str();
    if name.trim().is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if template.category.is_building() && template.max_workers == 0 {
        return Err(invalid(name, "buildings need at least one worker slot"));
    }
    if !template.category.is_building() && template.max_workers > 0 {
        return Err(invalid(name, "only buildings have worker slots"));
    }
    if template.category == CardCategory::Technology {
        if !template.build_cost.is_empty() {
            return Err(invalid(name, "technologies are researched, not built"));
        }
        if !template.production.is_empty() {
            return Err(invalid(name, "technologies do not produce"));
        }
    }
    Ok(())
}
