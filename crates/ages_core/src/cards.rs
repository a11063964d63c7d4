//! Card templates, card instances and the per-board card manager.
//!
//! Templates are immutable catalog entries. A [`CardInstance`] binds a
//! template to one board and carries the only mutable card state: the
//! number of workers on it. [`CardManager::add_card`] is the single path
//! by which cards enter a board.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::ActionAllowance;
use crate::corruption::BuildingCounts;
use crate::error::{GameError, Result};
use crate::resources::{ResourceKind, ResourceLedger, ResourceMap};

/// Game age. Ordered: `I < II < III`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Age {
    /// First age.
    #[default]
    I,
    /// Second age.
    II,
    /// Third and final age.
    III,
}

impl Age {
    /// The following age, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::I => Some(Self::II),
            Self::II => Some(Self::III),
            Self::III => None,
        }
    }

    /// Zero-based index, used in feature vectors.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I => f.write_str("I"),
            Self::II => f.write_str("II"),
            Self::III => f.write_str("III"),
        }
    }
}

/// Card categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CardCategory {
    /// Farms, mines, labs: produce per assigned worker.
    ProductionBuilding,
    /// Temples, theaters, arenas: produce per assigned worker.
    UrbanBuilding,
    /// Wonders: flat production, no workers.
    Wonder,
    /// Leaders: flat bonuses, no workers.
    Leader,
    /// Technologies: researched, never built.
    Technology,
}

impl CardCategory {
    /// Whether cards of this category hold workers.
    #[must_use]
    pub const fn is_building(self) -> bool {
        matches!(self, Self::ProductionBuilding | Self::UrbanBuilding)
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProductionBuilding => "production building",
            Self::UrbanBuilding => "urban building",
            Self::Wonder => "wonder",
            Self::Leader => "leader",
            Self::Technology => "technology",
        };
        f.write_str(name)
    }
}

/// Immutable card definition.
///
/// Built by the [`Catalog`](crate::catalog::Catalog) from validated data,
/// or directly with the builder methods in tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardTemplate {
    /// Unique card name.
    pub name: String,
    /// Category discriminator.
    pub category: CardCategory,
    /// Age the card belongs to.
    pub age: Age,
    /// Science needed to research the card. Zero means no research.
    pub tech_cost: u32,
    /// Resources paid when the card is built.
    pub build_cost: ResourceMap,
    /// Production per worker or flat, depending on the production policy.
    pub production: ResourceMap,
    /// One-time gain when the card enters the board.
    pub gain: ResourceMap,
    /// Worker slots. Zero for non-buildings.
    pub max_workers: u32,
    /// Victory points while the card is on the board.
    pub victory_points: u32,
    /// Extra actions per turn while the card is on the board.
    pub action_bonus: ActionAllowance,
}

impl CardTemplate {
    /// Create a template with no costs or effects.
    #[must_use]
    pub fn new(name: impl Into<String>, category: CardCategory, age: Age) -> Self {
        Self {
            name: name.into(),
            category,
            age,
            tech_cost: 0,
            build_cost: ResourceMap::new(),
            production: ResourceMap::new(),
            gain: ResourceMap::new(),
            max_workers: 0,
            victory_points: 0,
            action_bonus: ActionAllowance::default(),
        }
    }

    /// Builder: set the research cost.
    #[must_use]
    pub fn with_tech_cost(mut self, tech_cost: u32) -> Self {
        self.tech_cost = tech_cost;
        self
    }

    /// Builder: add a build cost entry.
    #[must_use]
    pub fn with_build_cost(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.build_cost.add(kind, amount);
        self
    }

    /// Builder: add a production entry.
    #[must_use]
    pub fn with_production(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.production.add(kind, amount);
        self
    }

    /// Builder: add a one-time gain entry.
    #[must_use]
    pub fn with_gain(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.gain.add(kind, amount);
        self
    }

    /// Builder: set worker slots.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: u32) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Builder: set victory points.
    #[must_use]
    pub fn with_victory_points(mut self, victory_points: u32) -> Self {
        self.victory_points = victory_points;
        self
    }

    /// Builder: set the action bonus.
    #[must_use]
    pub fn with_action_bonus(mut self, civil: u32, military: u32) -> Self {
        self.action_bonus = ActionAllowance::new(civil, military);
        self
    }

    /// Whether the card must be researched before it can be built.
    #[must_use]
    pub const fn requires_research(&self) -> bool {
        self.tech_cost > 0
    }
}

/// A template bound to one board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInstance {
    template: CardTemplate,
    assigned_workers: u32,
}

impl CardInstance {
    /// Create an instance with no workers.
    #[must_use]
    pub fn new(template: CardTemplate) -> Self {
        Self {
            template,
            assigned_workers: 0,
        }
    }

    /// Card name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// Underlying template.
    #[must_use]
    pub fn template(&self) -> &CardTemplate {
        &self.template
    }

    /// Workers on this card.
    #[must_use]
    pub const fn assigned_workers(&self) -> u32 {
        self.assigned_workers
    }

    pub(crate) fn set_assigned_workers(&mut self, count: u32) {
        self.assigned_workers = count;
    }
}

/// The four card collections of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Production buildings.
    ProductionBuildings,
    /// Urban buildings.
    UrbanBuildings,
    /// Wonders.
    Wonders,
    /// Leaders.
    Leaders,
}

impl Collection {
    /// All collections in board order.
    pub const ALL: [Self; 4] = [
        Self::ProductionBuildings,
        Self::UrbanBuildings,
        Self::Wonders,
        Self::Leaders,
    ];

    /// Category of cards this collection accepts.
    #[must_use]
    pub const fn category(self) -> CardCategory {
        match self {
            Self::ProductionBuildings => CardCategory::ProductionBuilding,
            Self::UrbanBuildings => CardCategory::UrbanBuilding,
            Self::Wonders => CardCategory::Wonder,
            Self::Leaders => CardCategory::Leader,
        }
    }

    /// Collection holding `category`, or `None` for technologies.
    #[must_use]
    pub const fn for_category(category: CardCategory) -> Option<Self> {
        match category {
            CardCategory::ProductionBuilding => Some(Self::ProductionBuildings),
            CardCategory::UrbanBuilding => Some(Self::UrbanBuildings),
            CardCategory::Wonder => Some(Self::Wonders),
            CardCategory::Leader => Some(Self::Leaders),
            CardCategory::Technology => None,
        }
    }
}

/// How strictly [`CardManager::add_card`] charges for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTerms {
    /// Debit the build cost.
    pub pay_cost: bool,
    /// Require prior research when the card has a tech cost.
    pub require_research: bool,
}

impl BuildTerms {
    /// Terms for a card built during play.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            pay_cost: true,
            require_research: true,
        }
    }

    /// Terms for cards placed during game setup.
    #[must_use]
    pub const fn starting() -> Self {
        Self {
            pay_cost: false,
            require_research: false,
        }
    }
}

/// Card collections and research state of one board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardManager {
    production_buildings: BTreeMap<String, CardInstance>,
    urban_buildings: BTreeMap<String, CardInstance>,
    wonders: BTreeMap<String, CardInstance>,
    leaders: BTreeMap<String, CardInstance>,
    researched: BTreeSet<String>,
}

impl CardManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collection_map(&self, collection: Collection) -> &BTreeMap<String, CardInstance> {
        match collection {
            Collection::ProductionBuildings => &self.production_buildings,
            Collection::UrbanBuildings => &self.urban_buildings,
            Collection::Wonders => &self.wonders,
            Collection::Leaders => &self.leaders,
        }
    }

    fn collection_map_mut(
        &mut self,
        collection: Collection,
    ) -> &mut BTreeMap<String, CardInstance> {
        match collection {
            Collection::ProductionBuildings => &mut self.production_buildings,
            Collection::UrbanBuildings => &mut self.urban_buildings,
            Collection::Wonders => &mut self.wonders,
            Collection::Leaders => &mut self.leaders,
        }
    }

    /// Validate everything [`add_card`](Self::add_card) would check.
    ///
    /// # Errors
    ///
    /// In order: [`GameError::CardTypeMismatch`], [`GameError::DuplicateCard`],
    /// [`GameError::TechnologyNotResearched`], [`GameError::UnaffordableCard`].
    pub fn check_add(
        &self,
        ledger: &ResourceLedger,
        template: &CardTemplate,
        collection: Collection,
        terms: BuildTerms,
    ) -> Result<()> {
        if template.category != collection.category() {
            return Err(GameError::CardTypeMismatch {
                card: template.name.clone(),
                expected: collection.category(),
                actual: template.category,
            });
        }
        if self.contains(&template.name) {
            return Err(GameError::DuplicateCard(template.name.clone()));
        }
        if terms.require_research
            && template.requires_research()
            && !self.is_researched(&template.name)
        {
            return Err(GameError::TechnologyNotResearched(template.name.clone()));
        }
        if terms.pay_cost {
            if let Some((resource, required, available)) = ledger.shortfall(&template.build_cost)
            {
                return Err(GameError::UnaffordableCard {
                    card: template.name.clone(),
                    resource,
                    required: u64::from(required),
                    available: u64::from(available),
                });
            }
        }
        Ok(())
    }

    /// Put a card on the board.
    ///
    /// Validates, then debits the build cost, creates an instance with no
    /// workers, applies the one-time gain and files it in `collection`.
    ///
    /// # Errors
    ///
    /// See [`check_add`](Self::check_add). Nothing changes on error.
    pub fn add_card(
        &mut self,
        ledger: &mut ResourceLedger,
        template: &CardTemplate,
        collection: Collection,
        terms: BuildTerms,
    ) -> Result<&CardInstance> {
        self.check_add(ledger, template, collection, terms)?;
        if terms.pay_cost {
            ledger.spend(&template.build_cost)?;
        }
        ledger.gain(&template.gain);
        let name = template.name.clone();
        let cards = self.collection_map_mut(collection);
        Ok(cards
            .entry(name)
            .or_insert_with(|| CardInstance::new(template.clone())))
    }

    /// Build a production building.
    ///
    /// # Errors
    ///
    /// See [`add_card`](Self::add_card).
    pub fn add_production_building(
        &mut self,
        ledger: &mut ResourceLedger,
        template: &CardTemplate,
    ) -> Result<&CardInstance> {
        self.add_card(
            ledger,
            template,
            Collection::ProductionBuildings,
            BuildTerms::standard(),
        )
    }

    /// Build an urban building.
    ///
    /// # Errors
    ///
    /// See [`add_card`](Self::add_card).
    pub fn add_urban_building(
        &mut self,
        ledger: &mut ResourceLedger,
        template: &CardTemplate,
    ) -> Result<&CardInstance> {
        self.add_card(
            ledger,
            template,
            Collection::UrbanBuildings,
            BuildTerms::standard(),
        )
    }

    /// Build a wonder.
    ///
    /// # Errors
    ///
    /// See [`add_card`](Self::add_card).
    pub fn add_wonder(
        &mut self,
        ledger: &mut ResourceLedger,
        template: &CardTemplate,
    ) -> Result<&CardInstance> {
        self.add_card(ledger, template, Collection::Wonders, BuildTerms::standard())
    }

    /// Take a leader.
    ///
    /// # Errors
    ///
    /// See [`add_card`](Self::add_card).
    pub fn add_leader(
        &mut self,
        ledger: &mut ResourceLedger,
        template: &CardTemplate,
    ) -> Result<&CardInstance> {
        self.add_card(ledger, template, Collection::Leaders, BuildTerms::standard())
    }

    /// Validate a research of `template`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidRequest`] for a card with nothing to research,
    /// [`GameError::AlreadyResearched`], or
    /// [`GameError::InsufficientResources`] for missing science.
    pub fn check_research(&self, ledger: &ResourceLedger, template: &CardTemplate) -> Result<()> {
        if !template.requires_research() && template.category != CardCategory::Technology {
            return Err(GameError::InvalidRequest(format!(
                "'{}' needs no research",
                template.name
            )));
        }
        if self.is_researched(&template.name) {
            return Err(GameError::AlreadyResearched(template.name.clone()));
        }
        let available = ledger.amount(ResourceKind::Science);
        if available < template.tech_cost {
            return Err(GameError::InsufficientResources {
                resource: ResourceKind::Science,
                required: u64::from(template.tech_cost),
                available: u64::from(available),
            });
        }
        Ok(())
    }

    /// Pay science and mark `template` researched.
    ///
    /// Technology cards apply their one-time gain on research, since they
    /// never enter a collection.
    ///
    /// # Errors
    ///
    /// See [`check_research`](Self::check_research). Nothing changes on error.
    pub fn research(&mut self, ledger: &mut ResourceLedger, template: &CardTemplate) -> Result<()> {
        self.check_research(ledger, template)?;
        ledger.spend(&ResourceMap::new().with(ResourceKind::Science, template.tech_cost))?;
        if template.category == CardCategory::Technology {
            ledger.gain(&template.gain);
        }
        self.researched.insert(template.name.clone());
        Ok(())
    }

    /// Whether `name` has been researched.
    #[must_use]
    pub fn is_researched(&self, name: &str) -> bool {
        self.researched.contains(name)
    }

    /// Researched card names in sorted order.
    pub fn researched(&self) -> impl Iterator<Item = &str> {
        self.researched.iter().map(String::as_str)
    }

    /// Whether a card named `name` is on the board.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Find a card on the board by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CardInstance> {
        Collection::ALL
            .iter()
            .find_map(|collection| self.collection_map(*collection).get(name))
    }

    /// Find a card on the board by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut CardInstance> {
        let collection = Collection::ALL
            .into_iter()
            .find(|collection| self.collection_map(*collection).contains_key(name))?;
        self.collection_map_mut(collection).get_mut(name)
    }

    /// Cards in one collection, sorted by name.
    pub fn collection(&self, collection: Collection) -> impl Iterator<Item = &CardInstance> {
        self.collection_map(collection).values()
    }

    /// All cards, collection by collection, each sorted by name.
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        Collection::ALL
            .into_iter()
            .flat_map(move |collection| self.collection_map(collection).values())
    }

    /// Number of cards on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        Collection::ALL
            .iter()
            .map(|collection| self.collection_map(*collection).len())
            .sum()
    }

    /// Whether the board has no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Production and urban building counts for corruption.
    #[must_use]
    pub fn building_counts(&self) -> BuildingCounts {
        BuildingCounts {
            production: u32::try_from(self.production_buildings.len()).unwrap_or(u32::MAX),
            urban: u32::try_from(self.urban_buildings.len()).unwrap_or(u32::MAX),
        }
    }
}
