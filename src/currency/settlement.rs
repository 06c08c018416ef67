use crate::currency::{Denomination, Ladder, SettlementConfig, Wallet};
use crate::error::{TradeError, TradeResult};
use crate::host::{ActorStore, Notifier};
use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Residues smaller than this are noise from the conversions and count as zero.
pub const TOLERANCE: Decimal = dec!(0.00001);

/// Wallets after a successful settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub buyer: Wallet,
    pub seller: Wallet,
}

/// Takes `cost` (in gold) out of the buyer's wallet and adds it to the seller's
/// gold. Returns `None` when the buyer cannot afford it.
pub fn settle(buyer: &Wallet, seller: &Wallet, cost: Decimal, config: &SettlementConfig) -> Option<Settlement> {
    let ladder = &config.ladder;
    let cost_in_platinum = cost / ladder.rate(Denomination::Gp);
    let funds_in_platinum = ladder.wallet_in_platinum(buyer);
    debug!("cost: {} pp, buyer funds: {} pp", cost_in_platinum, funds_in_platinum);

    if cost_in_platinum > funds_in_platinum {
        return None;
    }

    let funds = if config.convert_currency {
        Wallet { pp: funds_in_platinum - cost_in_platinum, ..Default::default() }
    } else {
        let mut funds = buyer.clone();
        funds.pp -= cost_in_platinum;
        borrow(&mut funds, ladder);
        make_change(&mut funds, ladder);
        funds
    };

    let mut seller = seller.clone();
    seller.gp += cost;

    Some(Settlement { buyer: funds.normalize(), seller: seller.normalize() })
}

/// Zeroes every negative denomination and carries the deficit into the next
/// lower one. Copper has nowhere to carry to, whatever is left there is noise.
fn borrow(funds: &mut Wallet, ladder: &Ladder) {
    for d in Denomination::ALL {
        let amount = funds.get(d);
        if amount >= dec!(0) {
            continue;
        }
        *funds.get_mut(d) = dec!(0);
        if amount > -TOLERANCE {
            continue;
        }
        if let Some(lower) = d.lower() {
            *funds.get_mut(lower) += amount * ladder.rate(lower);
        }
    }
}

/// Floors every denomination to whole coins and hands the fractions down as
/// change in the next lower one. Fractions of copper are dropped.
fn make_change(funds: &mut Wallet, ladder: &Ladder) {
    for d in Denomination::ALL {
        let amount = funds.get(d);
        let whole = round_to_tolerance(amount).floor().max(dec!(0));
        *funds.get_mut(d) = whole;
        if let Some(lower) = d.lower() {
            let fraction = round_to_tolerance(amount - whole);
            if fraction > dec!(0) {
                *funds.get_mut(lower) += fraction * ladder.rate(lower);
            }
        }
    }
}

fn round_to_tolerance(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(5, RoundingStrategy::MidpointAwayFromZero)
}

/// Checks the buyer's funds and moves `cost` (in gold) from buyer to seller.
///
/// When the buyer cannot pay, they get a notice and neither wallet changes.
/// Buyer and seller must be different actors.
pub async fn settle_funds<H>(
    host: &mut H,
    seller_id: &str,
    buyer_id: &str,
    cost: Decimal,
    config: &SettlementConfig,
) -> TradeResult<bool>
where H: ActorStore + Notifier,
{
    if seller_id == buyer_id {
        return Err(TradeError::SelfTrade(seller_id.to_string()));
    }
    let seller = host.actor(seller_id).await?;
    let buyer = host.actor(buyer_id).await?;

    let Some(settlement) = settle(&buyer.currency, &seller.currency, cost, config) else {
        let err = TradeError::InsufficientFunds { buyer: buyer.name.clone(), cost: cost.normalize() };
        info!("{}", err);
        host.notify(&buyer, &err.to_string()).await?;
        return Ok(false);
    };

    host.update_currency(seller_id, settlement.seller).await?;
    host.update_currency(buyer_id, settlement.buyer).await?;
    info!("{} paid {}gp to {}", buyer.name, cost.normalize(), seller.name);

    Ok(true)
}

#[cfg(test)]
mod test {
    use crate::currency::settlement::{settle, settle_funds, TOLERANCE};
    use crate::currency::{Denomination, Ladder, SettlementConfig, Wallet};
    use crate::error::TradeError;
    use crate::host::{Actor, ActorKind, ActorStore, Table};
    use futures::executor::block_on;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn partial() -> SettlementConfig {
        SettlementConfig::default()
    }

    fn converting() -> SettlementConfig {
        SettlementConfig { convert_currency: true, ..SettlementConfig::default() }
    }

    fn gold(amount: Decimal) -> Wallet {
        Wallet { gp: amount, ..Default::default() }
    }

    fn actor(id: &str, currency: Wallet) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            kind: ActorKind::Character,
            currency,
            items: vec![],
            price_modifier: None,
            observers: vec![],
        }
    }

    #[test]
    fn should_pay_from_gold_in_partial_mode() {
        let settlement = settle(&gold(dec!(10)), &Wallet::default(), dec!(5), &partial()).unwrap();

        assert_eq!(settlement.buyer, gold(dec!(5)));
        assert_eq!(settlement.seller, gold(dec!(5)));
    }

    #[test]
    fn should_fail_on_empty_wallet() {
        assert_eq!(settle(&Wallet::default(), &Wallet::default(), dec!(1), &partial()), None);
        assert_eq!(settle(&Wallet::default(), &Wallet::default(), dec!(1), &converting()), None);
    }

    #[test]
    fn should_break_platinum_into_change() {
        /*
         * Given
         */
        let buyer = Wallet { pp: dec!(1), gp: dec!(3), ep: dec!(1), sp: dec!(7), cp: dec!(12) };

        /*
         * When
         */
        let settlement = settle(&buyer, &gold(dec!(1)), dec!(2.37), &partial()).unwrap();

        /*
         * Then
         */
        assert_eq!(settlement.buyer, Wallet { pp: dec!(0), gp: dec!(10), ep: dec!(2), sp: dec!(8), cp: dec!(15) });
        assert_eq!(settlement.seller, gold(dec!(3.37)));
    }

    #[test]
    fn should_borrow_down_to_copper() {
        let buyer = Wallet { cp: dec!(500), ..Default::default() };

        let settlement = settle(&buyer, &Wallet::default(), dec!(1), &partial()).unwrap();

        assert_eq!(settlement.buyer, Wallet { cp: dec!(400), ..Default::default() });
    }

    #[test]
    fn should_spend_exactly_everything() {
        let buyer = Wallet { gp: dec!(1), ep: dec!(1), sp: dec!(3), cp: dec!(4), ..Default::default() };

        let settlement = settle(&buyer, &Wallet::default(), dec!(1.84), &partial()).unwrap();

        assert!(settlement.buyer.is_empty());
    }

    #[test]
    fn should_convert_to_platinum() {
        let buyer = Wallet { gp: dec!(10), sp: dec!(5), ..Default::default() };

        let settlement = settle(&buyer, &Wallet::default(), dec!(5), &converting()).unwrap();

        assert_eq!(settlement.buyer, Wallet { pp: dec!(0.55), ..Default::default() });
        assert_eq!(settlement.seller, gold(dec!(5)));
    }

    #[test]
    fn should_settle_with_custom_rates() {
        // 1 pp = 5 gp, 1 gp = 4 ep, 1 ep = 3 sp, 1 sp = 2 cp
        let config = SettlementConfig {
            ladder: Ladder::new(dec!(5), dec!(4), dec!(3), dec!(2)).unwrap(),
            ..SettlementConfig::default()
        };
        let buyer = Wallet { sp: dec!(24), ..Default::default() };

        let settlement = settle(&buyer, &Wallet::default(), dec!(1), &config).unwrap();

        assert_eq!(settlement.buyer, Wallet { sp: dec!(12), ..Default::default() });
    }

    #[test]
    fn should_update_wallets_and_notify() -> anyhow::Result<()> {
        /*
         * Given
         */
        let mut table = Table::new(vec![
            actor("vendor", Wallet::default()),
            actor("hero", gold(dec!(10))),
            actor("pauper", Wallet::default()),
        ]);
        let config = partial();

        /*
         * When
         */
        let paid = block_on(settle_funds(&mut table, "vendor", "hero", dec!(5), &config))?;
        let unpaid = block_on(settle_funds(&mut table, "vendor", "pauper", dec!(1), &config))?;

        /*
         * Then
         */
        assert!(paid);
        assert!(!unpaid);
        assert_eq!(block_on(table.actor("hero"))?.currency, gold(dec!(5)));
        assert_eq!(block_on(table.actor("vendor"))?.currency, gold(dec!(5)));
        assert!(block_on(table.actor("pauper"))?.currency.is_empty());
        assert_eq!(table.notices().len(), 1);
        assert_eq!(table.notices()[0].content, "pauper doesn't have enough funds to purchase an item for 1gp.");

        Ok(())
    }

    #[test]
    fn should_refuse_to_settle_with_oneself() -> anyhow::Result<()> {
        let mut table = Table::new(vec![actor("hero", gold(dec!(10)))]);

        let result = block_on(settle_funds(&mut table, "hero", "hero", dec!(5), &partial()));

        assert!(matches!(result, Err(TradeError::SelfTrade(id)) if id == "hero"));
        assert_eq!(block_on(table.actor("hero"))?.currency, gold(dec!(10)));
        assert!(table.notices().is_empty());

        Ok(())
    }

    #[test]
    fn should_report_missing_buyer_as_not_found() {
        let mut table = Table::new(vec![actor("vendor", Wallet::default())]);

        let result = block_on(settle_funds(&mut table, "vendor", "nobody", dec!(1), &partial()));

        assert!(matches!(result, Err(TradeError::ActorNotFound(id)) if id == "nobody"));
    }

    fn wallet_strategy() -> impl Strategy<Value = Wallet> {
        (0u32..20, 0u32..200, 0u32..50, 0u32..500, 0u32..2000).prop_map(|(pp, gp, ep, sp, cp)| Wallet {
            pp: pp.into(),
            gp: gp.into(),
            ep: ep.into(),
            sp: sp.into(),
            cp: cp.into(),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Whatever leaves the buyer is exactly the cost, in both modes.
        #[test]
        fn settlement_conserves_value(wallet in wallet_strategy(), copper in 0u32..1_000_000, convert in any::<bool>()) {
            let config = SettlementConfig { convert_currency: convert, ..SettlementConfig::default() };
            let ladder = &config.ladder;
            let total = ladder.wallet_in_gold(&wallet);
            let cost = (Decimal::from(copper) / dec!(100)).min(total);

            let settlement = settle(&wallet, &Wallet::default(), cost, &config).unwrap();

            let after = ladder.wallet_in_gold(&settlement.buyer);
            prop_assert!((after + cost - total).abs() <= TOLERANCE);
            prop_assert_eq!(settlement.seller.gp, cost);
        }

        #[test]
        fn unaffordable_settlement_fails(wallet in wallet_strategy(), extra in 1u32..10_000) {
            let config = SettlementConfig::default();
            let cost = config.ladder.wallet_in_gold(&wallet) + Decimal::from(extra) / dec!(100);

            prop_assert_eq!(settle(&wallet, &Wallet::default(), cost, &config), None);
        }

        #[test]
        fn partial_mode_leaves_whole_coins(wallet in wallet_strategy(), copper in 0u32..1_000_000) {
            let config = SettlementConfig::default();
            let cost = (Decimal::from(copper) / dec!(100)).min(config.ladder.wallet_in_gold(&wallet));

            let settlement = settle(&wallet, &Wallet::default(), cost, &config).unwrap();

            for (_, amount) in settlement.buyer.iter() {
                prop_assert!(amount >= dec!(0));
                prop_assert_eq!(amount, amount.trunc());
            }
        }

        #[test]
        fn convert_mode_leaves_only_platinum(wallet in wallet_strategy(), copper in 0u32..1_000_000) {
            let config = SettlementConfig { convert_currency: true, ..SettlementConfig::default() };
            let cost = (Decimal::from(copper) / dec!(100)).min(config.ladder.wallet_in_gold(&wallet));

            let settlement = settle(&wallet, &Wallet::default(), cost, &config).unwrap();

            for (d, amount) in settlement.buyer.iter() {
                if d != Denomination::Pp {
                    prop_assert!(amount.is_zero());
                }
            }
            prop_assert!(settlement.buyer.pp >= dec!(0));
        }
    }
}
