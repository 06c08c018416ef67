use crate::currency::Wallet;
use crate::error::TradeError;
use crate::host::{
    Actor, ActorId, ActorKind, ActorStore, ItemEligibility, ItemTransfer, Notifier, RecipientDirectory,
    ShareCalculator, TradeSummary,
};
use crate::trade::{ItemRef, TradeType};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Notice,
    Trade,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,

    #[serde(rename = "Kind")]
    pub kind: MessageKind,

    #[serde(rename = "Speaker")]
    pub speaker: String,

    #[serde(rename = "Content")]
    pub content: String,
}

/// A table of actors kept in memory, with a chat log.
#[derive(Debug, Default)]
pub struct Table {
    actors: BTreeMap<ActorId, Actor>,
    chat: Vec<ChatMessage>,
}

impl Table {
    pub fn new(actors: Vec<Actor>) -> Table {
        Table {
            actors: actors.into_iter().map(|a| (a.id.clone(), a)).collect(),
            chat: vec![],
        }
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn notices(&self) -> Vec<&ChatMessage> {
        self.chat.iter().filter(|m| m.kind == MessageKind::Notice).collect()
    }

    fn actor_mut(&mut self, id: &str) -> Result<&mut Actor> {
        self.actors.get_mut(id).ok_or_else(|| TradeError::ActorNotFound(id.to_string()).into())
    }

    fn post(&mut self, kind: MessageKind, speaker: &Actor, content: String) {
        debug!("[{:?}] {}: {}", kind, speaker.name, content);
        self.chat.push(ChatMessage { date: Utc::now(), kind, speaker: speaker.name.clone(), content });
    }
}

impl ActorStore for Table {
    async fn actor(&self, id: &str) -> Result<Actor> {
        self.actors.get(id)
            .cloned()
            .ok_or_else(|| TradeError::ActorNotFound(id.to_string()).into())
    }

    async fn update_currency(&mut self, id: &str, currency: Wallet) -> Result<()> {
        self.actor_mut(id)?.currency = currency;
        Ok(())
    }
}

impl ItemTransfer for Table {
    async fn move_items(&mut self, source: &str, destination: &str, items: &[ItemRef]) -> Result<Vec<ItemRef>> {
        if source == destination {
            return Err(anyhow!("cannot move items from {} to itself", source));
        }
        // Both actors must exist before anything moves.
        self.actor_mut(destination)?;
        let mut moved = vec![];

        for item_ref in items {
            let from = self.actor_mut(source)?;
            let Some(index) = from.items.iter().position(|i| i.id == item_ref.id) else {
                warn!("{} no longer holds item {}", from.name, item_ref.id);
                continue;
            };
            let quantity = item_ref.quantity.min(from.items[index].quantity);
            if quantity == 0 {
                continue;
            }

            let mut taken = from.items[index].clone();
            taken.quantity = quantity;
            from.items[index].quantity -= quantity;
            if from.items[index].quantity == 0 {
                from.items.remove(index);
            }

            let to = self.actor_mut(destination)?;
            match to.items.iter_mut().find(|i| i.id == taken.id) {
                Some(stack) => stack.quantity += quantity,
                None => to.items.push(taken.clone()),
            }
            moved.push(ItemRef::new(taken.id, taken.name, quantity));
        }

        Ok(moved)
    }
}

impl ItemEligibility for Table {}

impl ShareCalculator for Table {}

impl Notifier for Table {
    async fn notify(&mut self, actor: &Actor, message: &str) -> Result<()> {
        self.post(MessageKind::Notice, actor, message.to_string());
        Ok(())
    }

    async fn post_trade_summary(
        &mut self,
        source: &Actor,
        destination: &Actor,
        moved: &[ItemRef],
        summary: TradeSummary,
    ) -> Result<()> {
        if moved.is_empty() {
            return Ok(());
        }
        let items: Vec<String> = moved.iter().map(|i| i.to_string()).collect();
        let content = match summary.trade_type {
            TradeType::Buy => format!(
                "{} bought {} from {} (price modifier {}%).",
                destination.name, items.join(", "), source.name, percent(summary)
            ),
            TradeType::Sell => format!(
                "{} sold {} to {} (price modifier {}%).",
                destination.name, items.join(", "), source.name, percent(summary)
            ),
            TradeType::Loot => format!("{} looted {} from {}.", destination.name, items.join(", "), source.name),
        };
        self.post(MessageKind::Trade, source, content);
        Ok(())
    }

    async fn post_message(&mut self, speaker: &Actor, content: &str) -> Result<()> {
        self.post(MessageKind::Chat, speaker, content.to_string());
        Ok(())
    }
}

fn percent(summary: TradeSummary) -> String {
    (summary.price_modifier * dec!(100)).normalize().to_string()
}

impl RecipientDirectory for Table {
    async fn eligible_player_actors(&self, actor: &Actor) -> Result<Vec<ActorId>> {
        Ok(actor.observers.iter()
            .filter(|id| self.actors.get(*id).map_or(false, |a| a.kind == ActorKind::Character))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod test {
    use crate::host::{Actor, ActorKind, ActorStore, Item, ItemKind, ItemTransfer, RecipientDirectory, Table};
    use crate::trade::ItemRef;
    use futures::executor::block_on;
    use rust_decimal_macros::dec;

    fn actor(id: &str, kind: ActorKind, items: Vec<Item>, observers: Vec<&str>) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            currency: Default::default(),
            items,
            price_modifier: None,
            observers: observers.into_iter().map(String::from).collect(),
        }
    }

    fn rope(quantity: u32) -> Item {
        Item { id: "rope".to_string(), name: "Rope".to_string(), kind: ItemKind::Loot, price: dec!(1), quantity, equipped: false }
    }

    #[test]
    fn should_move_and_merge_stacks() -> anyhow::Result<()> {
        /*
         * Given
         */
        let mut table = Table::new(vec![
            actor("vendor", ActorKind::Npc, vec![rope(5)], vec![]),
            actor("hero", ActorKind::Character, vec![rope(1)], vec![]),
        ]);

        /*
         * When
         */
        let moved = block_on(table.move_items("vendor", "hero", &[
            ItemRef::new("rope".to_string(), "Rope".to_string(), 3),
            ItemRef::new("ghost".to_string(), "Ghost".to_string(), 1),
        ]))?;

        /*
         * Then
         */
        assert_eq!(moved, vec![ItemRef::new("rope".to_string(), "Rope".to_string(), 3)]);
        assert_eq!(block_on(table.actor("vendor"))?.items, vec![rope(2)]);
        assert_eq!(block_on(table.actor("hero"))?.items, vec![rope(4)]);

        /*
         * When
         */
        let moved = block_on(table.move_items("vendor", "hero", &[
            ItemRef::new("rope".to_string(), "Rope".to_string(), 10),
        ]))?;

        /*
         * Then
         */
        assert_eq!(moved[0].quantity, 2);
        assert!(block_on(table.actor("vendor"))?.items.is_empty());

        Ok(())
    }

    #[test]
    fn should_fail_for_unknown_actor() {
        let mut table = Table::new(vec![actor("vendor", ActorKind::Npc, vec![rope(1)], vec![])]);

        assert!(block_on(table.actor("nobody")).is_err());
        assert!(block_on(table.move_items("vendor", "nobody", &[])).is_err());
    }

    #[test]
    fn should_only_list_observing_characters() -> anyhow::Result<()> {
        let table = Table::new(vec![
            actor("chest", ActorKind::Npc, vec![], vec!["hero", "mimic", "nobody"]),
            actor("hero", ActorKind::Character, vec![], vec![]),
            actor("mimic", ActorKind::Npc, vec![], vec![]),
            actor("bard", ActorKind::Character, vec![], vec![]),
        ]);
        let chest = block_on(table.actor("chest"))?;

        let eligible = block_on(table.eligible_player_actors(&chest))?;

        assert_eq!(eligible, vec!["hero".to_string()]);
        Ok(())
    }
}
