//! Sell-price computation for outlet and regular variants.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::InvalidPricingInput;
use crate::grouper::Product;

/// Outlet price never drops below this share of retail.
const RETAIL_FLOOR: Decimal = Decimal::from_parts(70, 0, 0, false, 2);

/// Wholesale/retail ratio bands, checked in order: `(exclusive upper bound, multiplier)`.
const MARKUP_TIERS: [(Decimal, Decimal); 3] = [
    (
        Decimal::from_parts(20, 0, 0, false, 2),
        Decimal::from_parts(25, 0, 0, false, 1),
    ),
    (
        Decimal::from_parts(30, 0, 0, false, 2),
        Decimal::from_parts(22, 0, 0, false, 1),
    ),
    (
        Decimal::from_parts(40, 0, 0, false, 2),
        Decimal::from_parts(20, 0, 0, false, 1),
    ),
];

const DEFAULT_MULTIPLIER: Decimal = Decimal::from_parts(18, 0, 0, false, 1);

/// Computes the price a variant is sold at.
///
/// Regular items sell at retail. Outlet items are marked up from wholesale by
/// a tier chosen from the wholesale/retail ratio, then clamped to at least
/// 70 % of retail and rounded half away from zero to two decimals. A missing
/// wholesale price is treated as zero, which yields the floor price.
///
/// # Errors
///
/// Returns [`InvalidPricingInput`] when retail is not positive or wholesale
/// is negative.
pub fn price(
    wholesale: Option<Decimal>,
    retail: Decimal,
    is_outlet: bool,
) -> Result<Decimal, InvalidPricingInput> {
    if retail <= Decimal::ZERO {
        return Err(InvalidPricingInput::NonPositiveRetail { retail });
    }
    if let Some(w) = wholesale {
        if w < Decimal::ZERO {
            return Err(InvalidPricingInput::NegativeWholesale { wholesale: w });
        }
    }
    if !is_outlet {
        return Ok(retail);
    }

    let wholesale = wholesale.unwrap_or(Decimal::ZERO);
    let candidate = wholesale * markup_multiplier(wholesale / retail);
    let floor = retail * RETAIL_FLOOR;
    Ok(candidate
        .max(floor)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn markup_multiplier(ratio: Decimal) -> Decimal {
    MARKUP_TIERS
        .iter()
        .find(|(bound, _)| ratio < *bound)
        .map_or(DEFAULT_MULTIPLIER, |(_, m)| *m)
}

/// Compare-at price shown as the struck-through "before" price.
#[must_use]
pub fn compare_at(price: Decimal, retail: Decimal) -> Option<Decimal> {
    (price < retail).then_some(retail)
}

/// Prices every variant of `product` in place.
///
/// Variants whose inputs are invalid are removed from the product and
/// returned so the caller can report them.
pub fn apply_pricing(product: &mut Product) -> Vec<(String, InvalidPricingInput)> {
    let mut rejected = Vec::new();
    product.variants.retain_mut(|variant| {
        match price(variant.wholesale_price, variant.retail_price, variant.is_outlet) {
            Ok(p) => {
                variant.price = Some(p);
                variant.compare_at_price = compare_at(p, variant.retail_price);
                true
            }
            Err(e) => {
                rejected.push((variant.sku.clone(), e));
                false
            }
        }
    });
    rejected
}
