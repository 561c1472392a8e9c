//! Physics tuning and the category interaction table.

use kartsim_core::constants::{MAX_DROPOFF, MAX_STEP_MOVE};
use kartsim_core::Fixed;
use kartsim_entity::Category;
use serde::{Deserialize, Serialize};

/// What happens when two objects' footprints overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interaction {
    /// Nothing.
    #[default]
    Ignore,
    /// Deferred touch event for both objects.
    Touch,
    /// Pass through, but queue a rebound impulse for the pair.
    Bounce,
    /// Call [`on_pickup`](crate::InteractionHooks::on_pickup) immediately.
    Pickup,
    /// Solid: the move is rejected unless one can stand on the other.
    Block,
}

/// Interaction for every ordered (mover, other) category pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPolicy {
    table: [[Interaction; Category::COUNT]; Category::COUNT],
}

impl InteractionPolicy {
    /// Everything ignores everything.
    pub fn empty() -> Self {
        Self {
            table: [[Interaction::Ignore; Category::COUNT]; Category::COUNT],
        }
    }

    /// Kart racing rules: karts bounce off each other.
    pub fn kart_racing() -> Self {
        use Category::{Hazard, Item, Kart, Missile, Obstacle, Pickup};
        use Interaction::{Block, Bounce, Pickup as Collect, Touch};

        Self::empty()
            .with_symmetric(Kart, Kart, Bounce)
            .with_symmetric(Kart, Item, Touch)
            .with_symmetric(Kart, Missile, Touch)
            .with_symmetric(Kart, Pickup, Collect)
            .with_symmetric(Kart, Obstacle, Block)
            .with_symmetric(Kart, Hazard, Touch)
            .with_symmetric(Item, Item, Touch)
            .with_symmetric(Item, Missile, Touch)
            .with_symmetric(Item, Obstacle, Block)
            .with_symmetric(Missile, Missile, Touch)
            .with_symmetric(Missile, Obstacle, Block)
            .with_symmetric(Obstacle, Obstacle, Block)
    }

    /// Exclusion physics: karts are solid to each other.
    pub fn classic() -> Self {
        Self::kart_racing().with_symmetric(Category::Kart, Category::Kart, Interaction::Block)
    }

    #[inline]
    pub fn get(&self, mover: Category, other: Category) -> Interaction {
        self.table[mover.index()][other.index()]
    }

    /// Set the rule for `mover` moving into `other` only.
    pub fn set(&mut self, mover: Category, other: Category, interaction: Interaction) {
        self.table[mover.index()][other.index()] = interaction;
    }

    /// Set the rule for both orders of the pair.
    pub fn set_symmetric(&mut self, a: Category, b: Category, interaction: Interaction) {
        self.set(a, b, interaction);
        self.set(b, a, interaction);
    }

    #[must_use]
    pub fn with_symmetric(mut self, a: Category, b: Category, interaction: Interaction) -> Self {
        self.set_symmetric(a, b, interaction);
        self
    }
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self::kart_racing()
    }
}

/// Physics tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Largest floor rise an object climbs without being blocked.
    pub max_step: Fixed,
    /// Largest ledge a `NODROPOFF` object will walk off.
    pub max_dropoff: Fixed,
    /// Sub-step length as a fraction of the object's radius.
    pub substep_fraction: Fixed,
    /// Downward acceleration per tick.
    pub gravity: Fixed,
    /// Momentum multiplier for grounded objects, applied once per tick.
    pub friction: Fixed,
    /// Event batches drained per dispatch before the rest waits a tick.
    pub max_dispatch_rounds: u32,
    pub policy: InteractionPolicy,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_step: MAX_STEP_MOVE,
            max_dropoff: MAX_DROPOFF,
            substep_fraction: Fixed::ONE.half(),
            gravity: Fixed::ONE,
            // 0.90625, the classic ground friction
            friction: Fixed::from_raw(0xE800),
            max_dispatch_rounds: 8,
            policy: InteractionPolicy::default(),
        }
    }
}

impl PhysicsConfig {
    /// Set the step height.
    #[must_use]
    pub fn with_max_step(mut self, max_step: Fixed) -> Self {
        self.max_step = max_step;
        self
    }

    /// Set the drop-off limit.
    #[must_use]
    pub fn with_max_dropoff(mut self, max_dropoff: Fixed) -> Self {
        self.max_dropoff = max_dropoff;
        self
    }

    /// Set the sub-step fraction. Values are clamped to (0, 1].
    #[must_use]
    pub fn with_substep_fraction(mut self, fraction: Fixed) -> Self {
        self.substep_fraction = fraction.clamp(Fixed::from_raw(1), Fixed::ONE);
        self
    }

    /// Set gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Fixed) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set ground friction.
    #[must_use]
    pub fn with_friction(mut self, friction: Fixed) -> Self {
        self.friction = friction;
        self
    }

    /// Set the dispatch round limit.
    #[must_use]
    pub fn with_max_dispatch_rounds(mut self, rounds: u32) -> Self {
        self.max_dispatch_rounds = rounds.max(1);
        self
    }

    /// Set the interaction table.
    #[must_use]
    pub fn with_policy(mut self, policy: InteractionPolicy) -> Self {
        self.policy = policy;
        self
    }
}
