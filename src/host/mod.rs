//! Records and services owned by the hosting application.
//!
//! Trades only read actors and ask the host to update them; every mutation goes
//! through one of the traits below.
#![allow(async_fn_in_trait)]

pub mod memory;

use crate::currency::Wallet;
use crate::trade::{ItemRef, TradeType};
use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub use self::memory::Table;

pub type ActorId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    #[default]
    Npc,
    Character,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub kind: ActorKind,
    #[serde(default)]
    pub currency: Wallet,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Vendor price modifier flag, unset means 1.
    #[serde(default)]
    pub price_modifier: Option<Decimal>,
    /// Characters allowed to observe this actor, and so to receive shares of its coins.
    #[serde(default)]
    pub observers: Vec<ActorId>,
}

impl Actor {
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Equipment,
    Consumable,
    Tool,
    #[default]
    Loot,
    Backpack,
    Spell,
    Feat,
    Class,
}

impl ItemKind {
    /// Physical items can be carried off; spells, features and classes cannot.
    pub fn is_physical(&self) -> bool {
        !matches!(self, ItemKind::Spell | ItemKind::Feat | ItemKind::Class)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ItemKind,
    /// Listed price in gold.
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
}

fn default_quantity() -> u32 {
    1
}

impl Item {
    pub fn to_ref(&self) -> ItemRef {
        ItemRef::new(self.id.clone(), self.name.clone(), self.quantity)
    }
}

/// Extra details shown alongside a trade recap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeSummary {
    pub trade_type: TradeType,
    pub price_modifier: Decimal,
}

impl TradeSummary {
    pub fn loot() -> TradeSummary {
        TradeSummary { trade_type: TradeType::Loot, price_modifier: dec!(1) }
    }
}

pub trait ActorStore {
    async fn actor(&self, id: &str) -> Result<Actor>;

    /// Replaces the whole wallet of an actor in one update.
    async fn update_currency(&mut self, id: &str, currency: Wallet) -> Result<()>;
}

pub trait ItemTransfer {
    /// Moves items between inventories, clamping each quantity to what the source
    /// holds. Returns what actually moved.
    async fn move_items(&mut self, source: &str, destination: &str, items: &[ItemRef]) -> Result<Vec<ItemRef>>;
}

pub trait ItemEligibility {
    /// The items that may be taken without the owner's involvement.
    fn lootable_items(&self, items: &[Item]) -> Vec<Item> {
        items.iter()
            .filter(|i| !i.equipped && i.quantity > 0 && i.kind.is_physical())
            .cloned()
            .collect()
    }
}

pub trait Notifier {
    /// A user-facing notice to the owner of `actor`.
    async fn notify(&mut self, actor: &Actor, message: &str) -> Result<()>;

    async fn post_trade_summary(
        &mut self,
        source: &Actor,
        destination: &Actor,
        moved: &[ItemRef],
        summary: TradeSummary,
    ) -> Result<()>;

    async fn post_message(&mut self, speaker: &Actor, content: &str) -> Result<()>;
}

pub trait RecipientDirectory {
    /// Ids of the player characters eligible for a share of `actor`'s coins.
    async fn eligible_player_actors(&self, actor: &Actor) -> Result<Vec<ActorId>>;
}

pub trait ShareCalculator {
    /// Splits `currency` into equal whole-coin shares per recipient, returning the
    /// share and what is left over.
    fn compute_shares(&self, currency: &Wallet, recipients: usize) -> (Wallet, Wallet) {
        if recipients == 0 {
            return (Wallet::default(), currency.clone());
        }
        let count = Decimal::from(recipients as u64);
        let mut shares = Wallet::default();
        let mut remainder = Wallet::default();
        currency.iter().for_each(|(d, amount)| {
            let share = (amount / count).floor().max(dec!(0));
            *shares.get_mut(d) = share;
            *remainder.get_mut(d) = amount - share * count;
        });
        (shares, remainder)
    }
}

/// Everything a trade needs from the hosting application.
pub trait Host: ActorStore + ItemTransfer + ItemEligibility + Notifier + RecipientDirectory + ShareCalculator {}

impl<T> Host for T
where T: ActorStore + ItemTransfer + ItemEligibility + Notifier + RecipientDirectory + ShareCalculator {}

#[cfg(test)]
mod test {
    use super::*;

    struct Defaults;
    impl ItemEligibility for Defaults {}
    impl ShareCalculator for Defaults {}

    fn item(id: &str, kind: ItemKind, quantity: u32, equipped: bool) -> Item {
        Item { id: id.to_string(), name: id.to_string(), kind, price: dec!(1), quantity, equipped }
    }

    #[test]
    fn should_only_loot_unequipped_physical_items() {
        let items = vec![
            item("sword", ItemKind::Weapon, 1, true),
            item("dagger", ItemKind::Weapon, 2, false),
            item("fireball", ItemKind::Spell, 1, false),
            item("rope", ItemKind::Loot, 0, false),
            item("potion", ItemKind::Consumable, 3, false),
        ];

        let lootable: Vec<String> = Defaults.lootable_items(&items).into_iter().map(|i| i.id).collect();

        assert_eq!(lootable, vec!["dagger".to_string(), "potion".to_string()]);
    }

    #[test]
    fn should_split_currency_into_shares_and_remainder() {
        let currency = Wallet { gp: dec!(10), sp: dec!(7), cp: dec!(2), ..Default::default() };

        let (shares, remainder) = Defaults.compute_shares(&currency, 3);

        assert_eq!(shares, Wallet { gp: dec!(3), sp: dec!(2), ..Default::default() });
        assert_eq!(remainder, Wallet { gp: dec!(1), sp: dec!(1), cp: dec!(2), ..Default::default() });
    }

    #[test]
    fn should_keep_everything_without_recipients() {
        let currency = Wallet { gp: dec!(10), ..Default::default() };

        let (shares, remainder) = Defaults.compute_shares(&currency, 0);

        assert!(shares.is_empty());
        assert_eq!(remainder, currency);
    }
}
