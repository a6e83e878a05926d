//! Shared booster pack inventory
//!
//! Packs are generated once at startup and handed out one at a time. Taking
//! from an empty inventory is a normal outcome, reported as `None`.

use crate::catalog::{Card, Catalog, Rarity};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Mutex;

/// Rarity slots of every generated pack
pub const BOOSTER_SLOTS: [Rarity; 3] = [Rarity::Rare, Rarity::Uncommon, Rarity::Common];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoosterPack {
    pub id: String,
    pub cards: Vec<Card>,
}

impl BoosterPack {
    pub fn describe(&self) -> String {
        let cards: Vec<String> = self.cards.iter().map(|c| c.to_string()).collect();
        format!("{} -> {}", self.id, cards.join(", "))
    }
}

pub struct BoosterInventory {
    packs: Mutex<Vec<BoosterPack>>,
}

impl BoosterInventory {
    pub fn new(packs: Vec<BoosterPack>) -> Self {
        Self {
            packs: Mutex::new(packs),
        }
    }

    /// Generates `count` packs with one random card per rarity slot
    pub fn generate<R: Rng + ?Sized>(catalog: &Catalog, count: usize, rng: &mut R) -> Self {
        let pools: Vec<Vec<&Card>> = BOOSTER_SLOTS
            .iter()
            .map(|rarity| catalog.of_rarity(*rarity))
            .collect();

        let packs: Vec<BoosterPack> = (0..count)
            .map(|i| BoosterPack {
                id: format!("booster-{:04}", i + 1),
                cards: pools
                    .iter()
                    .filter_map(|pool| pool.choose(rng).map(|card| (*card).clone()))
                    .collect(),
            })
            .collect();

        info!("Prepared {} boosters", packs.len());
        Self::new(packs)
    }

    /// Pops the most recently generated pack
    pub async fn take_one(&self) -> Option<BoosterPack> {
        self.packs.lock().await.pop()
    }

    /// Number of packs left
    pub async fn remaining(&self) -> usize {
        self.packs.lock().await.len()
    }
}
