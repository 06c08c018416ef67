use crate::currency::{settle_funds, SettlementConfig, Wallet};
use crate::error::{TradeError, TradeResult};
use crate::host::{
    ActorId, ActorStore, Host, ItemEligibility, ItemTransfer, Notifier, RecipientDirectory, ShareCalculator,
    TradeSummary,
};
use crate::trade::prepare::{prepare_trade, unit_price};
use crate::trade::{ItemRef, TradeOptions, TradeOutcome, TradeReport, TradeRequest, TradeType};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// How a vendor's coins were split among the party.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub recipients: Vec<ActorId>,
    /// What each recipient received.
    pub share: Wallet,
    /// What the vendor kept.
    pub remainder: Wallet,
}

/// Runs trades between a vendor (or any NPC) and a player character.
pub struct TradeHelper<'a, H> {
    host: &'a mut H,
    config: &'a SettlementConfig,
    verbose: bool,
    chat_output: bool,
}

impl<'a, H: Host> TradeHelper<'a, H> {
    pub fn new(host: &'a mut H, config: &'a SettlementConfig) -> TradeHelper<'a, H> {
        TradeHelper { host, config, verbose: false, chat_output: true }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn chat_output(mut self, chat_output: bool) -> Self {
        self.chat_output = chat_output;
        self
    }

    /// Executes every non-empty bucket of `trades`, one after the other, and
    /// collects the outcome of each. A failing bucket does not stop the others.
    pub async fn execute_trade(&mut self, npc_id: &str, player_id: &str, trades: &TradeRequest) -> TradeResult<TradeReport> {
        let npc = self.host.actor(npc_id).await?;
        let price_modifier = self.config.price_modifier(npc.price_modifier);
        let mut report = TradeReport::default();

        for (tag, items) in trades.iter().filter(|(_, items)| !items.is_empty()) {
            let outcome = match tag.parse::<TradeType>() {
                Ok(trade_type) => {
                    let options = TradeOptions {
                        trade_type,
                        price_modifier,
                        verbose: self.verbose,
                        chat_output: self.chat_output,
                    };
                    self.handle_trade_by_type(npc_id, player_id, items, &options).await
                }
                Err(err) => Err(err),
            };
            match &outcome {
                Err(TradeError::UnknownTradeType(_)) => error!("{} trade between {} and {} aborted: unknown trade type", tag, npc.name, player_id),
                Err(err) => warn!("{} trade between {} and {} aborted: {}", tag, npc.name, player_id, err),
                Ok(_) => {}
            }
            report.outcomes.insert(tag.clone(), outcome);
        }

        Ok(report)
    }

    /// Executes one bucket: re-checks the items, settles payment for `buy` and
    /// `sell`, and only then moves the items.
    pub async fn handle_trade_by_type(
        &mut self,
        npc_id: &str,
        player_id: &str,
        items: &[ItemRef],
        options: &TradeOptions,
    ) -> TradeResult<TradeOutcome> {
        // (item source, item destination); payment flows the other way
        let (source_id, destination_id) = match options.trade_type {
            TradeType::Buy | TradeType::Loot => (npc_id, player_id),
            TradeType::Sell => (player_id, npc_id),
        };

        let source = self.host.actor(source_id).await?;
        let (items, total) = prepare_trade(&source.items, items, dec!(0), options);
        if items.is_empty() {
            info!("None of the requested items are left on {}, nothing to {}", source.name, options.trade_type);
            return Ok(TradeOutcome { trade_type: options.trade_type, moved: vec![], total });
        }

        if options.trade_type.requires_payment() {
            let paid = settle_funds(&mut *self.host, source_id, destination_id, total, self.config).await?;
            if options.verbose {
                info!("{} transaction successful: {}", options.trade_type, paid);
            }
            if !paid {
                let buyer = self.host.actor(destination_id).await?;
                return Err(TradeError::InsufficientFunds { buyer: buyer.name, cost: total.normalize() });
            }
        }

        let moved = self.host.move_items(source_id, destination_id, &items).await?;

        if options.chat_output {
            let npc = self.host.actor(npc_id).await?;
            let player = self.host.actor(player_id).await?;
            let summary = TradeSummary { trade_type: options.trade_type, price_modifier: options.price_modifier };
            self.host.post_trade_summary(&npc, &player, &moved, summary).await?;
        }

        Ok(TradeOutcome { trade_type: options.trade_type, moved, total })
    }

    /// Buys `quantity` of a single item from `seller_id`.
    pub async fn transaction(&mut self, seller_id: &str, buyer_id: &str, item_id: &str, quantity: u32) -> TradeResult<Vec<ItemRef>> {
        if quantity == 0 {
            let buyer = self.host.actor(buyer_id).await?;
            let err = TradeError::ZeroQuantityRequest;
            self.host.notify(&buyer, &err.to_string()).await?;
            return Err(err);
        }

        let seller = self.host.actor(seller_id).await?;
        let item = seller.item(item_id).ok_or_else(|| TradeError::StaleItemReference(item_id.to_string()))?;
        let price_modifier = self.config.price_modifier(seller.price_modifier);
        let quantity = quantity.min(item.quantity);
        let cost = unit_price(item.price, price_modifier) * Decimal::from(quantity);

        if !settle_funds(&mut *self.host, seller_id, buyer_id, cost, self.config).await? {
            let buyer = self.host.actor(buyer_id).await?;
            return Err(TradeError::InsufficientFunds { buyer: buyer.name, cost: cost.normalize() });
        }
        let item_ref = ItemRef::new(item.id.clone(), item.name.clone(), quantity);
        let moved = self.host.move_items(seller_id, buyer_id, &[item_ref]).await?;

        if self.chat_output {
            let buyer = self.host.actor(buyer_id).await?;
            let summary = TradeSummary { trade_type: TradeType::Buy, price_modifier };
            self.host.post_trade_summary(&seller, &buyer, &moved, summary).await?;
        }

        Ok(moved)
    }

    /// Moves `items` from `source_id` to `destination_id` without payment.
    pub async fn loot_items(&mut self, source_id: &str, destination_id: &str, items: &[ItemRef]) -> TradeResult<Vec<ItemRef>> {
        let moved = self.host.move_items(source_id, destination_id, items).await?;

        if self.chat_output {
            let source = self.host.actor(source_id).await?;
            let destination = self.host.actor(destination_id).await?;
            self.host.post_trade_summary(&source, &destination, &moved, TradeSummary::loot()).await?;
        }

        Ok(moved)
    }

    /// Takes every lootable item and all coins of `source_id`.
    pub async fn loot_all_items(&mut self, source_id: &str, destination_id: &str) -> TradeResult<(Vec<ItemRef>, Wallet)> {
        let source = self.host.actor(source_id).await?;
        let items: Vec<ItemRef> = self.host.lootable_items(&source.items)
            .iter()
            .map(|i| i.to_ref())
            .collect();

        let moved = self.loot_items(source_id, destination_id, &items).await?;
        let looted = self.loot_currency(source_id, destination_id).await?;

        Ok((moved, looted))
    }

    /// Moves all coins of `source_id` onto the matching denominations of
    /// `destination_id`. Returns what was taken.
    pub async fn loot_currency(&mut self, source_id: &str, destination_id: &str) -> TradeResult<Wallet> {
        let source = self.host.actor(source_id).await?;
        let destination = self.host.actor(destination_id).await?;
        let looted = source.currency.clone();
        if looted.is_empty() {
            return Ok(looted);
        }

        let mut currency = destination.currency.clone();
        currency.deposit(&looted);
        self.host.update_currency(destination_id, currency).await?;
        self.host.update_currency(source_id, Wallet::default()).await?;

        let coins: Vec<String> = looted.iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(d, amount)| format!("{} {} coins", amount.normalize(), d))
            .collect();
        let message = format!("{} receives: {}", destination.name, coins.join(", "));
        self.host.post_message(&source, &message).await?;

        Ok(looted)
    }

    /// Splits the coins of `npc_id` evenly between the eligible player
    /// characters. Whatever does not divide evenly stays with the NPC.
    pub async fn distribute_currency(&mut self, npc_id: &str) -> TradeResult<Distribution> {
        let npc = self.host.actor(npc_id).await?;
        let recipients = self.host.eligible_player_actors(&npc).await?;
        let (share, remainder) = self.host.compute_shares(&npc.currency, recipients.len());

        if self.verbose {
            debug!("{} currency: {:?}", npc.name, npc.currency);
            debug!("eligible recipients: {:?}", recipients);
            debug!("share: {:?}", share);
            debug!("remainder: {:?}", remainder);
        }

        if recipients.is_empty() || share.is_empty() {
            info!("Nothing to distribute from {} to {} recipients", npc.name, recipients.len());
            return Ok(Distribution { recipients, share: Wallet::default(), remainder: npc.currency });
        }

        let mut received = vec![];
        for id in &recipients {
            let recipient = self.host.actor(id).await?;
            let mut currency = recipient.currency.clone();
            currency.deposit(&share);
            self.host.update_currency(id, currency).await?;
            received.push(format!("{} receives: {}.", recipient.name, share));
        }
        self.host.update_currency(npc_id, remainder.clone()).await?;

        let mut shared = Wallet::default();
        let count = Decimal::from(recipients.len() as u64);
        share.iter().for_each(|(d, amount)| *shared.get_mut(d) = amount * count);
        let message = format!(
            "The {} coins of {} were shared between {} creatures. {}",
            shared, npc.name, recipients.len(), received.join(" ")
        );
        self.host.post_message(&npc, &message).await?;

        Ok(Distribution { recipients, share, remainder })
    }
}
