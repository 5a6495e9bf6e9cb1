use std::ops::{BitOr, BitOrAssign};

/// Bitmask of debug-draw categories a renderer may display.
///
/// The engine only stores and toggles these; drawing is up to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebugDrawFlags(u32);

impl DebugDrawFlags {
    pub const NONE: DebugDrawFlags = DebugDrawFlags(0);
    pub const CONSTRAINT: DebugDrawFlags = DebugDrawFlags(0x1);
    pub const MANIFOLD: DebugDrawFlags = DebugDrawFlags(0x2);
    pub const COLLISION_VOLUMES: DebugDrawFlags = DebugDrawFlags(0x4);
    pub const COLLISION_NORMALS: DebugDrawFlags = DebugDrawFlags(0x8);
    pub const SPATIAL_INDEX: DebugDrawFlags = DebugDrawFlags(0x10);
    pub const BOUNDING_RADIUS: DebugDrawFlags = DebugDrawFlags(0x20);

    const ALL_BITS: u32 = 0x3f;

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Keeps only the known category bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        DebugDrawFlags(bits & Self::ALL_BITS)
    }

    pub const fn contains(&self, other: DebugDrawFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: DebugDrawFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: DebugDrawFlags) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: DebugDrawFlags) {
        self.0 ^= other.0;
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DebugDrawFlags {
    fn default() -> Self {
        DebugDrawFlags(Self::CONSTRAINT.0 | Self::MANIFOLD.0 | Self::SPATIAL_INDEX.0)
    }
}

impl BitOr for DebugDrawFlags {
    type Output = DebugDrawFlags;

    fn bitor(self, rhs: DebugDrawFlags) -> DebugDrawFlags {
        DebugDrawFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for DebugDrawFlags {
    fn bitor_assign(&mut self, rhs: DebugDrawFlags) {
        self.0 |= rhs.0;
    }
}
