//! World objects for the kartsim movement core.
//!
//! Uses hecs as the object store. An [`ObjectId`] is a generational hecs
//! handle, so a removed object's id never resolves again and stale ids held
//! by in-flight queries fail their liveness check instead of aliasing a new
//! object.

pub mod category;
pub mod mobj;

pub use category::Category;
pub use hecs::{Entity, World};
pub use mobj::{Mobj, MobjFlags, MobjSpawn};

/// Handle to a world object.
pub type ObjectId = hecs::Entity;

/// Stable ordering key for an object id, used to canonicalise unordered pairs.
#[inline]
pub fn object_key(id: ObjectId) -> u64 {
    id.to_bits().get()
}
