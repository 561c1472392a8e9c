//! Static level geometry and the floor/ceiling surface model.
//!
//! A [`Level`] is built once by a [`LevelBuilder`] and is read-only during
//! simulation except for scripted sector height changes, which every height
//! query observes immediately.

pub mod level;
pub mod line;
pub mod sector;
pub mod slope;
pub mod surface;

pub use level::{Level, LevelBuilder};
pub use line::{Line, LineDef, LineFlags, Vertex};
pub use sector::{ExtraFloor, ExtraFloorFlags, Sector};
pub use slope::Slope;
pub use surface::{Opening, Surface, SurfaceQuery};
