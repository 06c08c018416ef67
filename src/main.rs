use anyhow::{anyhow, Context, Result};
use clap::Parser;
use futures::executor::block_on;
use lootsheet::{Action, Config, ItemRef, Ladder, SettlementConfig, TradeRequest, TradeType};
use rust_decimal::Decimal;

/// Trade, loot and share coins between the actors of a scene file, and print the resulting actors as csv.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(help = "Path to the scene json file that contains the actors.")]
    path: std::path::PathBuf,

    #[arg(long, help = "Id of the NPC (vendor, chest or corpse) to trade with")]
    npc: String,

    #[arg(long, help = "Id of the player character trading with the NPC")]
    player: Option<String>,

    #[arg(long, value_name = "ID[:QTY]", help = "Buy an item from the NPC. Can be repeated")]
    buy: Vec<ItemRef>,

    #[arg(long, value_name = "ID[:QTY]", help = "Sell an item to the NPC. Can be repeated")]
    sell: Vec<ItemRef>,

    #[arg(long, value_name = "ID[:QTY]", help = "Loot an item from the NPC. Can be repeated")]
    loot: Vec<ItemRef>,

    #[arg(long, help = "Loot every lootable item and all coins from the NPC")]
    loot_all: bool,

    #[arg(long, help = "Share the coins of the NPC between the characters observing it")]
    distribute: bool,

    #[arg(long, help = "Pay by converting the buyer's coins into a single platinum balance")]
    convert_currency: bool,

    #[arg(long, help = "Highest allowed price modifier in percent. Defaults to 200")]
    max_price_increase: Option<u32>,

    #[arg(long, value_delimiter = ',', value_name = "GP,EP,SP,CP", help = "Conversion rates down the ladder from platinum. Defaults to 10,2,5,10")]
    rates: Option<Vec<Decimal>>,

    #[arg(long, help = "Print the chat log instead of the actors")]
    print_chat: bool,

    #[arg(long, help = "Do not post trade summaries to the chat log")]
    no_chat: bool,

    #[arg(long, help = "Log every step of the trade")]
    verbose: bool,
}

impl Cli {
    fn to_config(self) -> Result<Config> {
        let Cli {
            path,
            npc,
            player,
            buy,
            sell,
            loot,
            loot_all,
            distribute,
            convert_currency,
            max_price_increase,
            rates,
            print_chat,
            no_chat,
            verbose,
        } = self;

        let ladder = match rates.as_deref() {
            None => Ladder::default(),
            Some(&[gp, ep, sp, cp]) => Ladder::new(gp, ep, sp, cp)?,
            Some(_) => return Err(anyhow!("--rates expects exactly four values: GP,EP,SP,CP")),
        };

        let action = match (loot_all, distribute) {
            (true, true) => return Err(anyhow!("--loot-all and --distribute cannot be combined")),
            (true, false) => Action::LootAll,
            (false, true) => Action::Distribute,
            (false, false) => {
                let trades: TradeRequest = [(TradeType::Buy, buy), (TradeType::Sell, sell), (TradeType::Loot, loot)]
                    .into_iter()
                    .map(|(trade_type, items)| (trade_type.tag().to_string(), items))
                    .collect();
                Action::Trade(trades)
            }
        };

        let config = Config {
            path,
            npc,
            player,
            action,
            settlement: SettlementConfig {
                convert_currency,
                max_price_increase: max_price_increase.unwrap_or(200),
                ladder,
            },
            verbose,
            chat_output: !no_chat,
            print_chat,
        };

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let config = args.to_config().context("Invalid command line flags")?;

    block_on(lootsheet::run(&config))
        .with_context(|| format!("Could not run the scene from file `{:?}`", &config.path))
}
