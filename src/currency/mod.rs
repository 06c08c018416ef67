pub mod settlement;

use crate::error::{TradeError, TradeResult};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::settlement::{settle, settle_funds, Settlement};

/// Coin denominations, highest value first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    Pp,
    Gp,
    Ep,
    Sp,
    Cp,
}

impl Denomination {
    pub const ALL: [Denomination; 5] = [
        Denomination::Pp,
        Denomination::Gp,
        Denomination::Ep,
        Denomination::Sp,
        Denomination::Cp,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Denomination::Pp => "pp",
            Denomination::Gp => "gp",
            Denomination::Ep => "ep",
            Denomination::Sp => "sp",
            Denomination::Cp => "cp",
        }
    }

    /// The next denomination down the ladder, `None` for copper.
    pub fn lower(&self) -> Option<Denomination> {
        match self {
            Denomination::Pp => Some(Denomination::Gp),
            Denomination::Gp => Some(Denomination::Ep),
            Denomination::Ep => Some(Denomination::Sp),
            Denomination::Sp => Some(Denomination::Cp),
            Denomination::Cp => None,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Conversion table for the denomination ladder.
///
/// Each rate is the number of coins of a denomination that one coin of the next
/// higher denomination is worth. Platinum sits at the top with a rate of 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    rates: [Decimal; 5],
}

impl Ladder {
    pub fn new(gp: Decimal, ep: Decimal, sp: Decimal, cp: Decimal) -> TradeResult<Ladder> {
        let rates = [dec!(1), gp, ep, sp, cp];
        if let Some((d, rate)) = Denomination::ALL.iter().zip(rates).find(|(_, r)| *r <= dec!(0)) {
            return Err(TradeError::InvalidConfig(format!(
                "conversion rate for {} must be > 0, got {}",
                d, rate
            )));
        }
        Ok(Ladder { rates })
    }

    pub fn rate(&self, denomination: Denomination) -> Decimal {
        self.rates[denomination.index()]
    }

    /// How many coins of `denomination` make up one platinum.
    pub fn per_platinum(&self, denomination: Denomination) -> Decimal {
        self.rates[..=denomination.index()].iter().fold(dec!(1), |acc, rate| acc * *rate)
    }

    pub fn to_platinum(&self, denomination: Denomination, amount: Decimal) -> Decimal {
        amount / self.per_platinum(denomination)
    }

    pub fn wallet_in_platinum(&self, wallet: &Wallet) -> Decimal {
        wallet.iter().map(|(d, amount)| self.to_platinum(d, amount)).sum()
    }

    pub fn wallet_in_gold(&self, wallet: &Wallet) -> Decimal {
        self.wallet_in_platinum(wallet) * self.rate(Denomination::Gp)
    }
}

impl Default for Ladder {
    /// 1 pp = 10 gp, 1 gp = 2 ep, 1 ep = 5 sp, 1 sp = 10 cp.
    fn default() -> Self {
        Ladder { rates: [dec!(1), dec!(10), dec!(2), dec!(5), dec!(10)] }
    }
}

/// Coin amounts held by an actor.
///
/// Amounts are meant to be non-negative but may dip below zero while a
/// settlement is being computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub pp: Decimal,
    pub gp: Decimal,
    pub ep: Decimal,
    pub sp: Decimal,
    pub cp: Decimal,
}

impl Wallet {
    pub fn get(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Pp => self.pp,
            Denomination::Gp => self.gp,
            Denomination::Ep => self.ep,
            Denomination::Sp => self.sp,
            Denomination::Cp => self.cp,
        }
    }

    pub fn get_mut(&mut self, denomination: Denomination) -> &mut Decimal {
        match denomination {
            Denomination::Pp => &mut self.pp,
            Denomination::Gp => &mut self.gp,
            Denomination::Ep => &mut self.ep,
            Denomination::Sp => &mut self.sp,
            Denomination::Cp => &mut self.cp,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Denomination, Decimal)> + '_ {
        Denomination::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, amount)| amount.is_zero())
    }

    /// Adds every denomination of `other` onto `self`, without conversion.
    pub fn deposit(&mut self, other: &Wallet) {
        Denomination::ALL.iter().for_each(|d| *self.get_mut(*d) += other.get(*d));
    }

    pub fn normalize(mut self) -> Wallet {
        Denomination::ALL.iter().for_each(|d| {
            let amount = self.get_mut(*d);
            *amount = amount.normalize();
        });
        self
    }
}

impl fmt::Display for Wallet {
    /// Lists the non-zero denominations, e.g. `3 gp, 2 sp`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(d, amount)| format!("{} {}", amount.normalize(), d))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Settings the preparation and settlement steps read.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementConfig {
    /// Replace the buyer's coins by a single platinum balance instead of
    /// paying from platinum down and keeping the coin mix.
    pub convert_currency: bool,
    /// Highest allowed price modifier, in percent.
    pub max_price_increase: u32,
    pub ladder: Ladder,
}

impl SettlementConfig {
    /// Vendor price modifier as used for pricing: defaults to 1, clamped to
    /// `[0, max_price_increase%]` and rounded to whole percent.
    pub fn price_modifier(&self, flag: Option<Decimal>) -> Decimal {
        let max = Decimal::from(self.max_price_increase) / dec!(100);
        flag.unwrap_or(dec!(1))
            .max(dec!(0))
            .min(max)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            convert_currency: false,
            max_price_increase: 200,
            ladder: Ladder::default(),
        }
    }
}
