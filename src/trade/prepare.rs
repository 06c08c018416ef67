use crate::host::Item;
use crate::trade::{ItemRef, TradeOptions};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

/// Unit price after the vendor modifier, rounded to the copper
/// (two decimals of gold) before any quantity is applied.
pub fn unit_price(price: Decimal, price_modifier: Decimal) -> Decimal {
    (price * price_modifier).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Checks the requested items against what the source still holds.
///
/// Items the source no longer has are dropped, quantities are clamped to the
/// stock, and the price of the rest is added onto `initial_sum`.
pub fn prepare_trade(
    source: &[Item],
    requested: &[ItemRef],
    initial_sum: Decimal,
    options: &TradeOptions,
) -> (Vec<ItemRef>, Decimal) {
    requested.iter()
        .fold((vec![], initial_sum), |(mut items, sum), item_ref| {
            let Some(item) = source.iter().find(|i| i.id == item_ref.id) else {
                if options.verbose {
                    debug!("Removed item \"{}\" (id: {}) from trade. Item not found in inventory of the source actor.",
                        item_ref.name, item_ref.id);
                }
                return (items, sum);
            };

            let quantity = item_ref.quantity.min(item.quantity);
            let sum = sum + unit_price(item.price, options.price_modifier) * Decimal::from(quantity);
            if options.verbose {
                debug!("{} x {} added, trade sum updated to: {}", quantity, item.name, sum);
            }

            items.push(ItemRef::new(item.id.clone(), item.name.clone(), quantity));
            (items, sum)
        })
}
