//! # Asset Model & Trait Derivation
//!
//! A Relic asset is a uniquely identified, singly-owned item whose traits
//! are fixed at creation and never change. Identifiers are sequential and
//! assigned by the ownership ledger; traits are derived here, once, from
//! the raw randomness delivered by the oracle at fulfilment time.
//!
//! The derivation is deterministic: the randomness is hashed once with
//! BLAKE3 and each trait is read off a disjoint digest byte. Determinism
//! and single use are the safety properties — replaying the same
//! randomness must yield the same traits, and a creation request is
//! consumed the moment it is fulfilled. The mapping itself (which byte
//! feeds which trait, how the rarity range is carved up) is policy, not
//! safety.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config;

/// Sequential asset identifier, assigned at mint time starting from 1.
pub type AssetId = u64;

// ---------------------------------------------------------------------------
// Trait Catalog
// ---------------------------------------------------------------------------

/// The era an asset was minted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Era {
    Neolithic,
    Bronze,
    Iron,
    Classical,
    Medieval,
    Renaissance,
    Industrial,
    Modern,
}

impl Era {
    fn from_byte(b: u8) -> Self {
        match b % config::ERA_VARIANTS {
            0 => Era::Neolithic,
            1 => Era::Bronze,
            2 => Era::Iron,
            3 => Era::Classical,
            4 => Era::Medieval,
            5 => Era::Renaissance,
            6 => Era::Industrial,
            _ => Era::Modern,
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::Neolithic => write!(f, "Neolithic"),
            Era::Bronze => write!(f, "Bronze"),
            Era::Iron => write!(f, "Iron"),
            Era::Classical => write!(f, "Classical"),
            Era::Medieval => write!(f, "Medieval"),
            Era::Renaissance => write!(f, "Renaissance"),
            Era::Industrial => write!(f, "Industrial"),
            Era::Modern => write!(f, "Modern"),
        }
    }
}

/// The material an asset is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    Clay,
    Stone,
    Bronze,
    Iron,
    Silver,
    Gold,
    Ivory,
    Crystal,
}

impl Material {
    fn from_byte(b: u8) -> Self {
        match b % config::MATERIAL_VARIANTS {
            0 => Material::Clay,
            1 => Material::Stone,
            2 => Material::Bronze,
            3 => Material::Iron,
            4 => Material::Silver,
            5 => Material::Gold,
            6 => Material::Ivory,
            _ => Material::Crystal,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Clay => write!(f, "Clay"),
            Material::Stone => write!(f, "Stone"),
            Material::Bronze => write!(f, "Bronze"),
            Material::Iron => write!(f, "Iron"),
            Material::Silver => write!(f, "Silver"),
            Material::Gold => write!(f, "Gold"),
            Material::Ivory => write!(f, "Ivory"),
            Material::Crystal => write!(f, "Crystal"),
        }
    }
}

/// Rarity tier, weighted at derivation time.
///
/// The weighting lives in [`config`]: roughly 60% common, 25% uncommon,
/// 10% rare, 5% legendary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    fn from_byte(b: u8) -> Self {
        if b >= config::RARITY_LEGENDARY_FLOOR {
            Rarity::Legendary
        } else if b >= config::RARITY_RARE_FLOOR {
            Rarity::Rare
        } else if b >= config::RARITY_UNCOMMON_FLOOR {
            Rarity::Uncommon
        } else {
            Rarity::Common
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Common => write!(f, "Common"),
            Rarity::Uncommon => write!(f, "Uncommon"),
            Rarity::Rare => write!(f, "Rare"),
            Rarity::Legendary => write!(f, "Legendary"),
        }
    }
}

// ---------------------------------------------------------------------------
// AssetTraits
// ---------------------------------------------------------------------------

/// The immutable trait payload of an asset.
///
/// Derived exactly once, at fulfilment, from the oracle's randomness.
/// Never mutated afterwards — the registry stores it verbatim for the
/// lifetime of the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTraits {
    /// Era variant.
    pub era: Era,
    /// Material variant.
    pub material: Material,
    /// Palette index into the presentation layer's color table. The
    /// ledger only guarantees it is stable; rendering is not its problem.
    pub palette: u8,
    /// Weighted rarity tier.
    pub rarity: Rarity,
    /// Hex-encoded BLAKE3 digest of the source randomness. Kept so anyone
    /// can re-derive the traits and check the registry didn't cheat.
    pub provenance: String,
}

impl AssetTraits {
    /// Derives the trait payload from raw oracle randomness.
    ///
    /// The randomness is hashed once (BLAKE3) and the traits are read off
    /// disjoint digest bytes:
    ///
    /// - byte 0 — era (mod [`config::ERA_VARIANTS`])
    /// - byte 1 — material (mod [`config::MATERIAL_VARIANTS`])
    /// - byte 2 — palette (verbatim)
    /// - byte 3 — rarity (weighted floors in [`config`])
    ///
    /// The full digest is kept, hex-encoded, as the provenance record.
    pub fn derive(random_value: &[u8; 32]) -> Self {
        let digest = blake3::hash(random_value);
        let d = digest.as_bytes();
        Self {
            era: Era::from_byte(d[0]),
            material: Material::from_byte(d[1]),
            palette: d[2],
            rarity: Rarity::from_byte(d[3]),
            provenance: hex::encode(d),
        }
    }
}

impl fmt::Display for AssetTraits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (palette {}, {})",
            self.era, self.material, self.palette, self.rarity
        )
    }
}
