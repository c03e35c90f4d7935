//! Raw cell values and the flag bits Tiled packs above the tile id.

/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal flip (anti-diagonal transpose) flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// 120 degree rotation flag on hexagonal maps.
pub const ROTATED_HEX: u32 = 0x1000_0000; // bit 28
/// Bits that hold the tile id.
pub const GID_MASK: u32 = 0x0FFF_FFFF; // keep lower 28 bits

/// A cell value as it appears on disk, flag bits included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(pub u32);

impl TileId {
    /// Tile id with every flag bit removed.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Horizontal flip flag set.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Vertical flip flag set.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Diagonal flip flag set.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    /// Hex rotation flag set.
    #[inline] pub fn rotated_hex(self) -> bool { (self.0 & ROTATED_HEX) != 0 }

    /// True when any transform flag is set.
    #[inline]
    pub fn is_transformed(self) -> bool {
        (self.0 & !GID_MASK) != 0
    }
}
