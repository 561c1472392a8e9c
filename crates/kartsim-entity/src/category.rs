//! Closed set of object categories used by the interaction policy table.

use serde::{Deserialize, Serialize};

/// What kind of thing an object is, for collision purposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Player-driven kart.
    Kart,
    /// Held or trailing item (bananas, shields).
    Item,
    /// Thrown or fired projectile.
    Missile,
    /// Collectible that reacts the instant it is touched (item boxes, rings).
    Pickup,
    /// Solid decoration or wall-like prop.
    Obstacle,
    /// Non-solid thing that hurts on contact (mines, fire).
    Hazard,
    /// Decoration with no interactions at all.
    #[default]
    Scenery,
}

impl Category {
    /// Number of categories; size of one policy table axis.
    pub const COUNT: usize = 7;

    /// Every category, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Kart,
        Self::Item,
        Self::Missile,
        Self::Pickup,
        Self::Obstacle,
        Self::Hazard,
        Self::Scenery,
    ];

    /// Position on a policy table axis.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Karts are the player class for extra floors that block only players.
    #[inline]
    pub const fn is_kart(self) -> bool {
        matches!(self, Self::Kart)
    }

    /// Get a display name for this category.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kart => "kart",
            Self::Item => "item",
            Self::Missile => "missile",
            Self::Pickup => "pickup",
            Self::Obstacle => "obstacle",
            Self::Hazard => "hazard",
            Self::Scenery => "scenery",
        }
    }
}
