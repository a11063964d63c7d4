//! Card data structures for data-driven card definitions.

use serde::{Deserialize, Serialize};

use crate::actions::ActionAllowance;
use crate::cards::{Age, CardCategory};
use crate::resources::ResourceMap;

/// Worker slots a building gets when its entry does not say.
pub const DEFAULT_BUILDING_WORKERS: u32 = 2;

/// Data-driven card definition.
///
/// One entry of a catalog document. `name`, `category` and `age` are
/// required; everything else defaults to "nothing".
///
/// # Example RON
///
/// ```ron
/// CardData(
///     name: "Drama",
///     category: UrbanBuilding,
///     age: I,
///     tech_cost: 3,
///     build_cost: { Material: 4 },
///     production: { Culture: 2 },
///     max_workers: Some(2),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardData {
    /// Unique card name.
    pub name: String,

    /// Card category.
    pub category: CardCategory,

    /// Age the card belongs to.
    pub age: Age,

    /// Science needed to research the card.
    #[serde(default)]
    pub tech_cost: u32,

    /// Resources paid to build the card.
    #[serde(default)]
    pub build_cost: ResourceMap,

    /// Production per worker (buildings) or flat (other categories).
    #[serde(default)]
    pub production: ResourceMap,

    /// One-time gain when the card enters play.
    #[serde(default)]
    pub gain: ResourceMap,

    /// Worker slots. Buildings only; defaults to
    /// [`DEFAULT_BUILDING_WORKERS`].
    #[serde(default)]
    pub max_workers: Option<u32>,

    /// Victory points while the card is on the board.
    #[serde(default)]
    pub victory_points: u32,

    /// Extra actions per turn while the card is on the board.
    #[serde(default)]
    pub action_bonus: ActionAllowance,
}
