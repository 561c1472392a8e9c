//! Identifiers for static level geometry.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

macro_rules! geometry_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable,
            Serialize, Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Index into the level's storage for this kind of item.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

geometry_id!(
    /// Index of a map vertex.
    VertexId,
    "v"
);
geometry_id!(
    /// Index of a line (linedef).
    LineId,
    "line"
);
geometry_id!(
    /// Index of a sector.
    SectorId,
    "sector"
);
geometry_id!(
    /// Index of a slope plane.
    SlopeId,
    "slope"
);
