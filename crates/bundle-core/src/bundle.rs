//! # Bundle Discount Engine
//!
//! Decides which bundles a cart qualifies for, prices each one, and picks a
//! non-overlapping set.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart lines + bundle catalog + now                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  evaluate_bundle() for every bundle        (independent, pure)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  candidates, stable-sorted by discount desc  (ties keep catalog order) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  greedy walk: skip any candidate touching an already-used product      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DiscountSummary { applied, total_discount, original_total, final }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The greedy walk is not globally optimal (two smaller bundles can beat one
//! larger overlapping bundle). Callers rely on highest-value-first,
//! first-fit-wins, so it stays greedy.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{BundleDefinition, BundleDiscount, CartLine, DiscountSummary, DiscountType};

/// Running totals while matching members against the cart.
#[derive(Debug, Default)]
struct Accumulator {
    used_quantity: i64,
    eligible_subtotal: Money,
    consumed: BTreeSet<String>,
}

impl Accumulator {
    fn take(&mut self, line: &CartLine, required_quantity: i64) {
        let used = line.quantity.min(required_quantity);
        self.used_quantity += used;
        self.eligible_subtotal += line.effective_unit_price().multiply_quantity(used);
        self.consumed.insert(line.product_id.clone());
    }
}

/// Evaluates one bundle against the cart.
///
/// Returns `None` when the bundle is inactive, expired, missing a required
/// member, or short of `min_quantity`.
///
/// ## Example
/// ```rust
/// use bundle_core::bundle::evaluate_bundle;
/// use bundle_core::{BundleDefinition, BundleMember, CartLine, DiscountType, Money};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let cart = vec![CartLine::new("P1", Money::from_cents(10000), 2)];
/// let bundle = BundleDefinition {
///     id: "b1".into(),
///     name: "Two for 10% off".into(),
///     discount_type: DiscountType::Percentage,
///     discount_value: 1000,
///     min_quantity: 2,
///     max_quantity: None,
///     is_active: true,
///     valid_from: now,
///     valid_until: None,
///     members: vec![BundleMember::required("P1", 2)],
/// };
///
/// let discount = evaluate_bundle(&cart, &bundle, now).unwrap();
/// assert_eq!(discount.eligible_subtotal.cents(), 20000);
/// assert_eq!(discount.discount_amount.cents(), 2000);
/// ```
pub fn evaluate_bundle(
    lines: &[CartLine],
    bundle: &BundleDefinition,
    now: DateTime<Utc>,
) -> Option<BundleDiscount> {
    if !bundle.is_live_at(now) {
        return None;
    }

    let by_product: HashMap<&str, &CartLine> = lines
        .iter()
        .map(|line| (line.product_id.as_str(), line))
        .collect();

    let mut acc = Accumulator::default();

    // Every required member must be satisfiable at once.
    for member in bundle.required_members() {
        let line = by_product.get(member.product_id.as_str())?;
        if line.quantity < member.required_quantity {
            return None;
        }
        acc.take(line, member.required_quantity);
    }

    for member in bundle.optional_members() {
        if let Some(line) = by_product.get(member.product_id.as_str()) {
            if line.quantity >= member.required_quantity {
                acc.take(line, member.required_quantity);
            }
        }
    }

    if acc.used_quantity < bundle.min_quantity {
        return None;
    }

    // max_quantity caps the unit count only.
    let mut used_quantity = acc.used_quantity;
    if let Some(max) = bundle.max_quantity {
        used_quantity = used_quantity.min(max);
    }

    let eligible = acc.eligible_subtotal;
    let raw_discount = match bundle.discount_type {
        DiscountType::Percentage => eligible.percentage(bundle.discount_value),
        DiscountType::Fixed => Money::from_cents(bundle.discount_value).min(eligible),
        DiscountType::BuyXGetY => {
            let groups = used_quantity.checked_div(bundle.min_quantity).unwrap_or(0);
            let free_units = groups.saturating_mul(bundle.discount_value);
            eligible.prorate(free_units, used_quantity)
        }
    };

    let discount_amount = raw_discount.clamp_to(Money::zero(), eligible.max(Money::zero()));
    let discounted_subtotal = (eligible - discount_amount).max(Money::zero());

    Some(BundleDiscount {
        bundle_id: bundle.id.clone(),
        bundle_name: bundle.name.clone(),
        discount_amount,
        eligible_subtotal: eligible,
        discounted_subtotal,
        consumed_product_ids: acc.consumed,
    })
}

/// Evaluates every bundle and greedily applies the most valuable
/// non-overlapping ones.
///
/// Ties on `discount_amount` keep the order of `bundles`, so feeding the
/// catalog in a stable order gives a reproducible result.
pub fn select_best_discounts(
    lines: &[CartLine],
    bundles: &[BundleDefinition],
    now: DateTime<Utc>,
) -> DiscountSummary {
    let mut candidates: Vec<BundleDiscount> = bundles
        .iter()
        .filter_map(|bundle| evaluate_bundle(lines, bundle, now))
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.discount_amount.cmp(&a.discount_amount));

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut applied = Vec::new();
    for candidate in candidates {
        if candidate.overlaps(&used) {
            continue;
        }
        used.extend(candidate.consumed_product_ids.iter().cloned());
        applied.push(candidate);
    }

    let total_discount: Money = applied.iter().map(|d| d.discount_amount).sum();
    let original_total: Money = lines.iter().map(CartLine::line_total).sum();
    let final_total = (original_total - total_discount).max(Money::zero());

    DiscountSummary {
        applied,
        total_discount,
        original_total,
        final_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BundleMember;
    use chrono::Duration;

    fn line(id: &str, price_cents: i64, quantity: i64) -> CartLine {
        CartLine::new(id, Money::from_cents(price_cents), quantity)
    }

    fn only(product_id: &str, quantity: i64) -> Vec<BundleMember> {
        vec![BundleMember::required(product_id, quantity)]
    }

    fn bundle(
        id: &str,
        discount_type: DiscountType,
        discount_value: i64,
        min_quantity: i64,
        members: Vec<BundleMember>,
    ) -> BundleDefinition {
        BundleDefinition {
            id: id.to_string(),
            name: format!("Bundle {}", id),
            discount_type,
            discount_value,
            min_quantity,
            max_quantity: None,
            is_active: true,
            valid_from: Utc::now() - Duration::days(30),
            valid_until: None,
            members,
        }
    }

    #[test]
    fn test_inactive_bundle_never_applies() {
        let now = Utc::now();
        let cart = vec![line("P1", 1000, 10)];
        let mut b = bundle("b1", DiscountType::Percentage, 5000, 1, only("P1", 1));
        b.is_active = false;

        assert!(evaluate_bundle(&cart, &b, now).is_none());
    }

    #[test]
    fn test_expired_bundle_never_applies() {
        let now = Utc::now();
        let cart = vec![line("P1", 1000, 10)];
        let mut b = bundle("b1", DiscountType::Fixed, 100, 1, only("P1", 1));
        b.valid_until = Some(now - Duration::hours(1));

        assert!(evaluate_bundle(&cart, &b, now).is_none());
    }

    #[test]
    fn test_required_member_short_of_quantity() {
        let cart = vec![line("A", 1000, 1)];
        let b = bundle("b1", DiscountType::Percentage, 1000, 1, only("A", 2));

        assert!(evaluate_bundle(&cart, &b, Utc::now()).is_none());
    }

    #[test]
    fn test_required_member_missing_from_cart() {
        let cart = vec![line("A", 1000, 5)];
        let b = bundle(
            "b1",
            DiscountType::Percentage,
            1000,
            1,
            vec![BundleMember::required("A", 1), BundleMember::required("GHOST", 1)],
        );

        assert!(evaluate_bundle(&cart, &b, Utc::now()).is_none());
    }

    #[test]
    fn test_fixed_discount_capped_at_eligible_subtotal() {
        let cart = vec![line("A", 5000, 1)];
        let b = bundle("b1", DiscountType::Fixed, 100_000, 1, only("A", 1));

        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 5000);
        assert_eq!(d.discount_amount.cents(), 5000);
        assert_eq!(d.discounted_subtotal.cents(), 0);
    }

    #[test]
    fn test_percentage_discount_is_linear() {
        let cart = vec![line("A", 10000, 1)];
        let b = bundle("b1", DiscountType::Percentage, 2000, 1, only("A", 1));

        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.discount_amount.cents(), 2000);
        assert_eq!(d.discounted_subtotal.cents(), 8000);
    }

    #[test]
    fn test_used_quantity_limited_to_required_quantity() {
        // Five in cart, bundle needs two: only two count toward the subtotal.
        let cart = vec![line("A", 1000, 5)];
        let b = bundle("b1", DiscountType::Percentage, 1000, 2, only("A", 2));

        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 2000);
        assert_eq!(d.discount_amount.cents(), 200);
    }

    #[test]
    fn test_optional_member_adds_when_present() {
        let b = bundle(
            "b1",
            DiscountType::Percentage,
            1000,
            1,
            vec![BundleMember::required("A", 1), BundleMember::optional("B", 1)],
        );

        let without = evaluate_bundle(&[line("A", 1000, 1)], &b, Utc::now()).unwrap();
        assert_eq!(without.eligible_subtotal.cents(), 1000);
        assert_eq!(without.consumed_product_ids.len(), 1);

        let cart = vec![line("A", 1000, 1), line("B", 3000, 1)];
        let with = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(with.eligible_subtotal.cents(), 4000);
        assert!(with.consumed_product_ids.contains("B"));
    }

    #[test]
    fn test_optional_member_below_quantity_is_ignored() {
        let b = bundle(
            "b1",
            DiscountType::Percentage,
            1000,
            1,
            vec![BundleMember::required("A", 1), BundleMember::optional("B", 3)],
        );

        let cart = vec![line("A", 1000, 1), line("B", 3000, 2)];
        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 1000);
        assert!(!d.consumed_product_ids.contains("B"));
    }

    #[test]
    fn test_optional_members_can_satisfy_min_quantity() {
        let b = bundle(
            "b1",
            DiscountType::Fixed,
            500,
            2,
            vec![BundleMember::optional("A", 1), BundleMember::optional("B", 1)],
        );

        assert!(evaluate_bundle(&[line("A", 1000, 1)], &b, Utc::now()).is_none());
        let both = vec![line("A", 1000, 1), line("B", 1000, 1)];
        assert!(evaluate_bundle(&both, &b, Utc::now()).is_some());
    }

    #[test]
    fn test_min_quantity_not_reached() {
        let b = bundle("b1", DiscountType::Percentage, 1000, 3, only("A", 2));
        assert!(evaluate_bundle(&[line("A", 1000, 10)], &b, Utc::now()).is_none());
    }

    #[test]
    fn test_buy_x_get_y() {
        // Buy 2 get 1 free over three members at 10.00 each.
        let cart = vec![
            line("A", 1000, 1),
            line("B", 1000, 1),
            line("C", 1000, 1),
            line("D", 1000, 1),
        ];
        let b = bundle(
            "b1",
            DiscountType::BuyXGetY,
            1,
            2,
            vec![
                BundleMember::required("A", 1),
                BundleMember::required("B", 1),
                BundleMember::required("C", 1),
                BundleMember::required("D", 1),
            ],
        );

        // 4 units / group of 2 = 2 groups × 1 free = 2 free units at 10.00
        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 4000);
        assert_eq!(d.discount_amount.cents(), 2000);
    }

    #[test]
    fn test_buy_x_get_y_uses_average_unit_price() {
        let cart = vec![line("A", 1000, 1), line("B", 2000, 1), line("C", 3000, 1)];
        let b = bundle(
            "b1",
            DiscountType::BuyXGetY,
            1,
            3,
            vec![
                BundleMember::required("A", 1),
                BundleMember::required("B", 1),
                BundleMember::required("C", 1),
            ],
        );

        // 1 free unit at average 20.00
        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.discount_amount.cents(), 2000);
    }

    #[test]
    fn test_max_quantity_clamps_units_but_not_subtotal() {
        let cart = vec![line("A", 1000, 6)];
        let mut b = bundle("b1", DiscountType::BuyXGetY, 1, 2, only("A", 6));
        b.max_quantity = Some(4);

        // 6 units clamped to 4 → 2 free units; average = 6000 / 4 = 15.00
        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 6000);
        assert_eq!(d.discount_amount.cents(), 3000);
    }

    #[test]
    fn test_buy_x_get_y_discount_never_exceeds_subtotal() {
        let cart = vec![line("A", 1000, 2)];
        let b = bundle("b1", DiscountType::BuyXGetY, 5, 1, only("A", 2));

        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.discount_amount, d.eligible_subtotal);
        assert_eq!(d.discounted_subtotal.cents(), 0);
    }

    #[test]
    fn test_sale_price_feeds_eligible_subtotal() {
        let cart = vec![line("A", 1000, 1).with_sale_price(Money::from_cents(800))];
        let b = bundle("b1", DiscountType::Percentage, 5000, 1, only("A", 1));

        let d = evaluate_bundle(&cart, &b, Utc::now()).unwrap();
        assert_eq!(d.eligible_subtotal.cents(), 800);
        assert_eq!(d.discount_amount.cents(), 400);
    }

    #[test]
    fn test_overlapping_bundles_keep_highest_value() {
        let now = Utc::now();
        let cart = vec![line("A", 1000, 2), line("B", 1000, 1)];
        let small = bundle("small", DiscountType::Fixed, 100, 1, only("A", 1));
        let big = bundle(
            "big",
            DiscountType::Fixed,
            500,
            1,
            vec![BundleMember::required("A", 1), BundleMember::required("B", 1)],
        );

        let summary = select_best_discounts(&cart, &[small, big], now);
        assert_eq!(summary.applied.len(), 1);
        assert_eq!(summary.applied[0].bundle_id, "big");
        assert_eq!(summary.total_discount.cents(), 500);
    }

    #[test]
    fn test_disjoint_bundles_stack() {
        let cart = vec![line("A", 1000, 1), line("B", 2000, 1)];
        let bundles = vec![
            bundle("a", DiscountType::Fixed, 100, 1, only("A", 1)),
            bundle("b", DiscountType::Fixed, 300, 1, only("B", 1)),
        ];

        let summary = select_best_discounts(&cart, &bundles, Utc::now());
        let ids: Vec<&str> = summary.applied.iter().map(|d| d.bundle_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(summary.total_discount.cents(), 400);
        assert_eq!(summary.original_total.cents(), 3000);
        assert_eq!(summary.final_total.cents(), 2600);
    }

    #[test]
    fn test_greedy_is_not_globally_optimal() {
        // X (6.00) spans A and B; Y (4.00) and Z (4.00) cover them separately.
        // Greedy takes X and rejects Y and Z even though Y + Z = 8.00.
        let cart = vec![line("A", 1000, 1), line("B", 1000, 1)];
        let bundles = vec![
            bundle("y", DiscountType::Fixed, 400, 1, only("A", 1)),
            bundle(
                "x",
                DiscountType::Fixed,
                600,
                1,
                vec![BundleMember::required("A", 1), BundleMember::required("B", 1)],
            ),
            bundle("z", DiscountType::Fixed, 400, 1, only("B", 1)),
        ];

        let summary = select_best_discounts(&cart, &bundles, Utc::now());
        assert_eq!(summary.applied.len(), 1);
        assert_eq!(summary.applied[0].bundle_id, "x");
        assert_eq!(summary.total_discount.cents(), 600);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let cart = vec![line("A", 1000, 1)];
        let bundles = vec![
            bundle("first", DiscountType::Fixed, 200, 1, only("A", 1)),
            bundle("second", DiscountType::Fixed, 200, 1, only("A", 1)),
        ];

        let summary = select_best_discounts(&cart, &bundles, Utc::now());
        assert_eq!(summary.applied.len(), 1);
        assert_eq!(summary.applied[0].bundle_id, "first");

        let reversed: Vec<_> = bundles.into_iter().rev().collect();
        let summary = select_best_discounts(&cart, &reversed, Utc::now());
        assert_eq!(summary.applied[0].bundle_id, "second");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let now = Utc::now();
        let cart = vec![line("A", 1000, 3), line("B", 2500, 2), line("C", 400, 5)];
        let bundles = vec![
            bundle("a", DiscountType::Percentage, 1500, 2, only("A", 2)),
            bundle(
                "ab",
                DiscountType::Fixed,
                700,
                2,
                vec![BundleMember::required("A", 1), BundleMember::required("B", 1)],
            ),
            bundle("c", DiscountType::BuyXGetY, 1, 3, only("C", 5)),
        ];

        let first = select_best_discounts(&cart, &bundles, now);
        let second = select_best_discounts(&cart, &bundles, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_percentage_scenario() {
        let cart = vec![line("P1", 10000, 2)];
        let bundles = vec![bundle(
            "b1",
            DiscountType::Percentage,
            1000,
            2,
            only("P1", 2),
        )];

        let summary = select_best_discounts(&cart, &bundles, Utc::now());
        assert_eq!(summary.applied.len(), 1);
        assert_eq!(summary.applied[0].eligible_subtotal.cents(), 20000);
        assert_eq!(summary.total_discount.cents(), 2000);
        assert_eq!(summary.final_total.cents(), 18000);
    }

    #[test]
    fn test_final_total_never_negative() {
        let cart = vec![
            line("A", 1000, 1).with_sale_price(Money::from_cents(100)),
            line("B", 50, 1),
        ];
        let bundles = vec![
            bundle("a", DiscountType::Fixed, 100_000, 1, only("A", 1)),
            bundle("b", DiscountType::Percentage, 10000, 1, only("B", 1)),
        ];

        let summary = select_best_discounts(&cart, &bundles, Utc::now());
        assert_eq!(summary.total_discount.cents(), 150);
        assert_eq!(summary.original_total.cents(), 150);
        assert!(!summary.final_total.is_negative());
        assert_eq!(summary.final_total.cents(), 0);
    }

    #[test]
    fn test_empty_inputs() {
        let now = Utc::now();
        let bundles = vec![bundle("b1", DiscountType::Fixed, 100, 1, only("A", 1))];

        let summary = select_best_discounts(&[], &bundles, now);
        assert!(summary.applied.is_empty());
        assert!(summary.total_discount.is_zero());
        assert!(summary.final_total.is_zero());

        let cart = vec![line("A", 1000, 1)];
        let summary = select_best_discounts(&cart, &[], now);
        assert!(summary.applied.is_empty());
        assert_eq!(summary.final_total.cents(), 1000);
    }

    #[test]
    fn test_original_total_uses_effective_price() {
        let now = Utc::now();
        let cart = vec![
            line("P1", 1000, 2).with_sale_price(Money::from_cents(800)),
            line("P2", 500, 1),
        ];

        let summary = select_best_discounts(&cart, &[], now);
        assert_eq!(summary.original_total.cents(), 2100);

        let bundles = vec![bundle("b1", DiscountType::Percentage, 1000, 2, only("P1", 2))];
        let summary = select_best_discounts(&cart, &bundles, now);
        assert_eq!(summary.applied[0].eligible_subtotal.cents(), 1600);
        assert_eq!(summary.total_discount.cents(), 160);
        assert_eq!(summary.final_total.cents(), 1940);
    }

    #[test]
    fn test_zero_quantity_bounds_do_not_panic() {
        let cart = vec![line("A", 1000, 3)];

        let zero_group = bundle("b1", DiscountType::BuyXGetY, 1, 0, only("A", 3));
        let d = evaluate_bundle(&cart, &zero_group, Utc::now()).unwrap();
        assert!(d.discount_amount.is_zero());

        let mut zero_cap = bundle("b2", DiscountType::BuyXGetY, 1, 1, only("A", 3));
        zero_cap.max_quantity = Some(0);
        let d = evaluate_bundle(&cart, &zero_cap, Utc::now()).unwrap();
        assert!(d.discount_amount.is_zero());
        assert_eq!(d.eligible_subtotal.cents(), 3000);
    }
}
