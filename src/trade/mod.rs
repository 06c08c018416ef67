pub mod helper;
pub mod prepare;

use crate::error::{TradeError, TradeResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use self::helper::TradeHelper;
pub use self::prepare::prepare_trade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// Player buys from the vendor.
    Buy,
    /// Player sells to the vendor.
    Sell,
    /// Player takes from the vendor without paying.
    Loot,
}

impl TradeType {
    pub fn requires_payment(&self) -> bool {
        !matches!(self, TradeType::Loot)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
            TradeType::Loot => "loot",
        }
    }
}

impl FromStr for TradeType {
    type Err = TradeError;

    fn from_str(s: &str) -> TradeResult<TradeType> {
        match s {
            "buy" => Ok(TradeType::Buy),
            "sell" => Ok(TradeType::Sell),
            "loot" => Ok(TradeType::Loot),
            _ => Err(TradeError::UnknownTradeType(s.to_string())),
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// An item and the quantity of it to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
}

impl ItemRef {
    pub fn new(id: String, name: String, quantity: u32) -> ItemRef {
        ItemRef { id, name, quantity }
    }
}

impl FromStr for ItemRef {
    type Err = String;

    /// Parses `ID` or `ID:QUANTITY`; the quantity defaults to 1.
    fn from_str(s: &str) -> Result<ItemRef, String> {
        let (id, quantity) = match s.split_once(':') {
            Some((id, quantity)) => {
                let quantity = quantity.trim().parse::<u32>()
                    .map_err(|e| format!("invalid quantity in `{}`: {}", s, e))?;
                (id, quantity)
            }
            None => (s, 1),
        };
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("missing item id in `{}`", s));
        }
        Ok(ItemRef::new(id.to_string(), String::new(), quantity))
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.quantity, self.name)
    }
}

/// Items to move, keyed by trade type tag. Tags are kept as given so that an
/// unknown one can be reported without affecting the others.
pub type TradeRequest = BTreeMap<String, Vec<ItemRef>>;

/// Per-call context handed from the dispatcher to the type handler.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOptions {
    pub trade_type: TradeType,
    pub price_modifier: Decimal,
    pub verbose: bool,
    pub chat_output: bool,
}

/// What one trade type bucket did.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub trade_type: TradeType,
    /// The items that actually moved.
    pub moved: Vec<ItemRef>,
    /// Total price in gold.
    pub total: Decimal,
}

/// Aggregated result of every bucket of a trade request.
#[derive(Debug, Default)]
pub struct TradeReport {
    pub outcomes: BTreeMap<String, TradeResult<TradeOutcome>>,
}

impl TradeReport {
    pub fn outcome(&self, tag: &str) -> Option<&TradeOutcome> {
        self.outcomes.get(tag).and_then(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&String, &TradeError)> {
        self.outcomes.iter().filter_map(|(tag, o)| o.as_ref().err().map(|e| (tag, e)))
    }

    pub fn moved(&self) -> Vec<&ItemRef> {
        self.outcomes.values()
            .filter_map(|o| o.as_ref().ok())
            .flat_map(|o| o.moved.iter())
            .collect()
    }
}
