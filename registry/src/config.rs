//! # Protocol Constants
//!
//! Every tunable default and catalog dimension in Relic lives here. The
//! runtime-mutable values (minting cost, max supply, operator) are fields
//! of the marketplace state with operator-gated setters — what's below is
//! only their initial values plus the fixed trait-catalog geometry.

// ---------------------------------------------------------------------------
// Monetary Units
// ---------------------------------------------------------------------------

/// Smallest monetary denomination. All amounts in the ledger are motes;
/// one displayed coin is a billion of them. Callers format, we count.
pub const MOTES_PER_COIN: u64 = 1_000_000_000;

/// Initial cost of a creation request: one whole coin.
pub const DEFAULT_MINTING_COST: u64 = MOTES_PER_COIN;

/// Initial cap on the number of assets the registry will ever mint.
pub const DEFAULT_MAX_SUPPLY: u64 = 100;

// ---------------------------------------------------------------------------
// Trait Catalog
// ---------------------------------------------------------------------------

/// Number of era variants an asset can be minted into.
pub const ERA_VARIANTS: u8 = 8;

/// Number of material variants an asset can be minted into.
pub const MATERIAL_VARIANTS: u8 = 8;

/// Rarity is read off a single digest byte. Bytes below the uncommon
/// floor are common (~60%); the remaining floors carve out ~25%, ~10%,
/// and ~5% of the byte range.
pub const RARITY_UNCOMMON_FLOOR: u8 = 154;

/// Bytes at or above this floor (and below the legendary floor) are rare.
pub const RARITY_RARE_FLOOR: u8 = 218;

/// Bytes at or above this floor are legendary.
pub const RARITY_LEGENDARY_FLOOR: u8 = 243;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monetary_defaults_sane() {
        assert!(DEFAULT_MINTING_COST > 0);
        assert!(DEFAULT_MAX_SUPPLY > 0);
        assert_eq!(DEFAULT_MINTING_COST % MOTES_PER_COIN, 0);
    }

    #[test]
    fn rarity_floors_ordered() {
        assert!(RARITY_UNCOMMON_FLOOR < RARITY_RARE_FLOOR);
        assert!(RARITY_RARE_FLOOR < RARITY_LEGENDARY_FLOOR);
    }

    #[test]
    fn catalog_dimensions_fit_a_byte() {
        // Trait derivation reduces digest bytes modulo these counts.
        assert!(ERA_VARIANTS > 0 && MATERIAL_VARIANTS > 0);
        assert!(ERA_VARIANTS as u16 <= 256);
        assert!(MATERIAL_VARIANTS as u16 <= 256);
    }
}
