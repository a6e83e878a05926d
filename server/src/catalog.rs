//! Static card catalog
//!
//! Built once at startup and shared read-only, so it needs no lock. Every
//! card's power is derived from its rarity through [`Rarity::damage`], which
//! is defined for every tier.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::CardId;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Epic];

    /// Damage dealt to the opponent when a card of this rarity is played
    pub const fn damage(self) -> u32 {
        match self {
            Rarity::Common => 10,
            Rarity::Uncommon => 20,
            Rarity::Rare => 30,
            Rarity::Epic => 40,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub power: u32,
}

impl Card {
    pub fn new(id: CardId, rarity: Rarity) -> Self {
        Self {
            id,
            name: format!("Card {} ({})", id, rarity),
            rarity,
            power: rarity.damage(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    cards: BTreeMap<CardId, Card>,
}

impl Catalog {
    /// The stock catalog: 1-5 Rare, 6-10 Uncommon, 11-20 Common, 21-22 Epic
    pub fn standard() -> Self {
        let cards = (1..=22).map(|id| {
            let rarity = match id {
                1..=5 => Rarity::Rare,
                6..=10 => Rarity::Uncommon,
                11..=20 => Rarity::Common,
                _ => Rarity::Epic,
            };
            Card::new(id, rarity)
        });
        Self::from_cards(cards)
    }

    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().map(|card| (card.id, card)).collect(),
        }
    }

    /// Looks up a card by id
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// All cards of one rarity, in id order
    pub fn of_rarity(&self, rarity: Rarity) -> Vec<&Card> {
        self.cards().filter(|card| card.rarity == rarity).collect()
    }

    /// Deals up to `count` distinct cards at random
    pub fn deal<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<Card> {
        let all: Vec<&Card> = self.cards().collect();
        all.choose_multiple(rng, count)
            .map(|card| (*card).clone())
            .collect()
    }

    /// Text block answering `/cartas`, ordered by card id
    pub fn listing(&self) -> String {
        let mut text = String::from("Game cards:");
        for card in self.cards() {
            text.push_str(&format!("\n  {} - {} damage", card, card.power));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_damage_is_defined_for_every_rarity() {
        let damages: Vec<u32> = Rarity::ALL.iter().map(|r| r.damage()).collect();
        assert_eq!(damages, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_standard_catalog_layout() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), 22);
        assert_eq!(catalog.get(1).unwrap().rarity, Rarity::Rare);
        assert_eq!(catalog.get(1).unwrap().power, 30);
        assert_eq!(catalog.get(6).unwrap().rarity, Rarity::Uncommon);
        assert_eq!(catalog.get(20).unwrap().rarity, Rarity::Common);
        assert_eq!(catalog.get(22).unwrap().rarity, Rarity::Epic);
        assert!(catalog.get(23).is_none());
        assert_eq!(catalog.of_rarity(Rarity::Rare).len(), 5);
        assert_eq!(catalog.of_rarity(Rarity::Common).len(), 10);
    }

    #[test]
    fn test_card_power_follows_rarity() {
        let catalog = Catalog::standard();
        for card in catalog.cards() {
            assert_eq!(card.power, card.rarity.damage());
        }
    }

    #[test]
    fn test_deal_gives_distinct_cards() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let hand = catalog.deal(&mut rng, 5);

        assert_eq!(hand.len(), 5);
        let ids: HashSet<CardId> = hand.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 5);
        assert!(hand.iter().all(|c| catalog.get(c.id).is_some()));
    }

    #[test]
    fn test_deal_stops_when_catalog_runs_out() {
        let catalog = Catalog::from_cards(vec![Card::new(1, Rarity::Rare), Card::new(2, Rarity::Common)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog.deal(&mut rng, 5).len(), 2);
    }

    #[test]
    fn test_listing_is_ordered() {
        let listing = Catalog::standard().listing();
        let first = listing.find("[1]").unwrap();
        let second = listing.find("[2]").unwrap();
        assert!(first < second);
        assert!(listing.starts_with("Game cards:"));
        assert!(listing.contains("[22] Card 22 (Epic) - 40 damage"));
    }
}
