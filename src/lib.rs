use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

pub mod currency;
pub mod error;
pub mod host;
pub mod trade;
mod reader;
mod writer;

pub use self::currency::{Denomination, Ladder, SettlementConfig, Wallet};
pub use self::error::{TradeError, TradeResult};
pub use self::host::{Actor, Host, Item, Table};
pub use self::trade::{ItemRef, TradeHelper, TradeRequest, TradeType};

use self::writer::ActorRow;

pub struct Config {
    pub path: PathBuf,
    pub npc: String,
    pub player: Option<String>,
    pub action: Action,
    pub settlement: SettlementConfig,
    pub verbose: bool,
    pub chat_output: bool,
    pub print_chat: bool,
}

pub enum Action {
    Trade(TradeRequest),
    LootAll,
    Distribute,
}

/// Reads the scene from the path, runs the configured action against it,
/// and finally prints the actors (or the chat log) to `std::io::stdout()`.
pub async fn run(config: &Config) -> Result<()> {
    let now = Instant::now();
    let scene = reader::read_scene(&config.path).await?;
    let mut table = Table::new(scene.actors);
    info!("Done reading scene. Elapsed: {:.2?}", now.elapsed());

    let now = Instant::now();
    match &config.action {
        Action::Trade(trades) => trade(&mut table, config, trades).await?,
        Action::LootAll => loot_all(&mut table, config).await?,
        Action::Distribute => distribute(&mut table, config).await?,
    }
    info!("Done with {}. Elapsed: {:.2?}", config.npc, now.elapsed());

    let now = Instant::now();
    if config.print_chat {
        writer::print(table.chat()).await?;
    } else {
        let rows: Vec<ActorRow> = table.actors().map(ActorRow::new).collect();
        writer::print(&rows).await?;
    }
    info!("Done printing results. Elapsed: {:.2?}", now.elapsed());

    Ok(())
}

fn helper<'a>(table: &'a mut Table, config: &'a Config) -> TradeHelper<'a, Table> {
    TradeHelper::new(table, &config.settlement)
        .verbose(config.verbose)
        .chat_output(config.chat_output)
}

fn player(config: &Config) -> Result<&str> {
    config.player.as_deref().context("A player character is required for this action")
}

/// Executes the trade request between the NPC and the player character.
pub async fn trade(table: &mut Table, config: &Config, trades: &TradeRequest) -> Result<()> {
    let player = player(config)?;
    let report = helper(table, config).execute_trade(&config.npc, player, trades).await
        .with_context(|| format!("Could not trade between `{}` and `{}`", config.npc, player))?;

    for (tag, err) in report.failures() {
        warn!("{} failed: {}", tag, err);
    }
    info!("{} items moved", report.moved().len());
    Ok(())
}

/// Moves every lootable item and all coins from the NPC to the player character.
pub async fn loot_all(table: &mut Table, config: &Config) -> Result<()> {
    let player = player(config)?;
    let (moved, looted) = helper(table, config).loot_all_items(&config.npc, player).await
        .with_context(|| format!("Could not loot `{}`", config.npc))?;
    info!("{} looted {} items and {:?}", player, moved.len(), looted);
    Ok(())
}

/// Shares the coins of the NPC between the eligible player characters.
pub async fn distribute(table: &mut Table, config: &Config) -> Result<()> {
    let distribution = helper(table, config).distribute_currency(&config.npc).await
        .with_context(|| format!("Could not distribute the coins of `{}`", config.npc))?;
    info!("{} recipients received {:?} each", distribution.recipients.len(), distribution.share);
    Ok(())
}
