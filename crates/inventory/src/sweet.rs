use serde::{Deserialize, Serialize};

use sweetshop_core::{DomainError, DomainResult, Entity, SweetId, ValueObject};

use crate::stock::StockStatus;

/// Price in the smallest currency unit (cents). `2.50` is `Price::from_cents(250)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Largest storable price. Backends keep prices in signed 64-bit columns.
    pub const MAX: Price = Price(i64::MAX as u64);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Data supplied to create a catalog item. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSweet {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewSweet {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: Price, quantity: u32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            quantity,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_price(self.price)
    }
}

/// Partial update: present fields overwrite, absent fields keep their value.
///
/// An empty `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub quantity: Option<u32>,
    pub description: Option<String>,
}

impl SweetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.description.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(price) = self.price {
            require_price(price)?;
        }
        Ok(())
    }
}

/// A catalog entry with its current stock.
///
/// Fields are private: stock only moves through [`SweetItem::purchase`] and
/// [`SweetItem::restock`], which keep it non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweetItem {
    id: SweetId,
    name: String,
    category: String,
    price: Price,
    quantity: u32,
    description: Option<String>,
}

impl SweetItem {
    /// Validate `data` and build a new item under `id`.
    pub fn create(id: SweetId, data: NewSweet) -> DomainResult<Self> {
        data.validate()?;
        Ok(Self::rehydrate(id, data))
    }

    /// Rebuild an item from stored state without re-validating it.
    pub fn rehydrate(id: SweetId, data: NewSweet) -> Self {
        Self {
            id,
            name: data.name,
            category: data.category,
            price: data.price,
            quantity: data.quantity,
            description: normalize_description(data.description),
        }
    }

    pub fn id_typed(&self) -> SweetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.quantity)
    }

    /// Merge `patch` into a copy of this item. `self` is left untouched on error.
    pub fn patched(&self, patch: &SweetPatch) -> DomainResult<Self> {
        patch.validate()?;
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(category) = &patch.category {
            next.category = category.clone();
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(quantity) = patch.quantity {
            next.quantity = quantity;
        }
        if let Some(description) = &patch.description {
            next.description = normalize_description(Some(description.clone()));
        }
        Ok(next)
    }

    /// Take `quantity` units out of stock. All-or-nothing.
    pub fn purchase(&mut self, quantity: u32) -> DomainResult<()> {
        require_positive(quantity)?;
        if quantity > self.quantity {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.quantity,
            });
        }
        self.quantity -= quantity;
        Ok(())
    }

    /// Add `quantity` units to stock.
    pub fn restock(&mut self, quantity: u32) -> DomainResult<()> {
        require_positive(quantity)?;
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("restock would overflow the stock counter"))?;
        Ok(())
    }

    /// Stock value in cents (`price * quantity`).
    pub fn stock_value(&self) -> u128 {
        u128::from(self.price.cents()) * u128::from(self.quantity)
    }
}

impl Entity for SweetItem {
    type Id = SweetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Purchase and restock quantities must be at least one unit.
pub fn require_positive(quantity: u32) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be greater than zero"));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_price(price: Price) -> DomainResult<()> {
    if price > Price::MAX {
        return Err(DomainError::validation("price is too large"));
    }
    Ok(())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truffles() -> SweetItem {
        SweetItem::create(
            SweetId::new(),
            NewSweet::new("Chocolate Truffles", "Chocolate", Price::from_cents(250), 50)
                .with_description("Rich, creamy chocolate truffles."),
        )
        .unwrap()
    }

    #[test]
    fn purchase_restock_walkthrough() {
        let mut item = truffles();

        item.purchase(10).unwrap();
        assert_eq!(item.quantity(), 40);

        let err = item.purchase(41).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(item.quantity(), 40);

        item.restock(5).unwrap();
        assert_eq!(item.quantity(), 45);
    }

    #[test]
    fn purchase_of_entire_stock_is_allowed() {
        let mut item = truffles();
        item.purchase(50).unwrap();
        assert_eq!(item.quantity(), 0);
        assert_eq!(item.stock_status(), StockStatus::OutOfStock);
    }

    #[test]
    fn zero_quantities_are_rejected() {
        let mut item = truffles();
        assert!(matches!(item.purchase(0), Err(DomainError::Validation(_))));
        assert!(matches!(item.restock(0), Err(DomainError::Validation(_))));
        assert_eq!(item.quantity(), 50);
    }

    #[test]
    fn restock_overflow_is_rejected_without_mutation() {
        let mut item = truffles();
        let err = item.restock(u32::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.quantity(), 50);
    }

    #[test]
    fn create_rejects_blank_name_and_category() {
        let err = SweetItem::create(SweetId::new(), NewSweet::new("   ", "Fudge", Price::ZERO, 1)).unwrap_err();
        assert_eq!(err, DomainError::validation("name cannot be empty"));

        let err = SweetItem::create(SweetId::new(), NewSweet::new("Fudge", "", Price::ZERO, 1)).unwrap_err();
        assert_eq!(err, DomainError::validation("category cannot be empty"));
    }

    #[test]
    fn price_above_storable_range_is_rejected() {
        let too_big = Price::from_cents(Price::MAX.cents() + 1);

        let err = SweetItem::create(SweetId::new(), NewSweet::new("Gold Bar", "Specialty", too_big, 1)).unwrap_err();
        assert_eq!(err, DomainError::validation("price is too large"));

        let patch = SweetPatch {
            price: Some(too_big),
            ..SweetPatch::default()
        };
        assert!(truffles().patched(&patch).is_err());

        assert!(SweetItem::create(SweetId::new(), NewSweet::new("Gold Bar", "Specialty", Price::MAX, 1)).is_ok());
    }

    #[test]
    fn zero_price_is_allowed_at_domain_level() {
        let item = SweetItem::create(SweetId::new(), NewSweet::new("Sample", "Specialty", Price::ZERO, 3)).unwrap();
        assert_eq!(item.price(), Price::ZERO);
    }

    #[test]
    fn patch_changes_only_supplied_fields() {
        let item = truffles();
        let patch = SweetPatch {
            price: Some(Price::from_cents(300)),
            ..SweetPatch::default()
        };

        let patched = item.patched(&patch).unwrap();
        assert_eq!(patched.price(), Price::from_cents(300));
        assert_eq!(patched.name(), item.name());
        assert_eq!(patched.category(), item.category());
        assert_eq!(patched.quantity(), item.quantity());
        assert_eq!(patched.description(), item.description());
        assert_eq!(patched.id_typed(), item.id_typed());
    }

    #[test]
    fn patch_with_empty_description_clears_it() {
        let item = truffles();
        let patch = SweetPatch {
            description: Some(String::new()),
            ..SweetPatch::default()
        };
        assert_eq!(item.patched(&patch).unwrap().description(), None);
    }

    #[test]
    fn invalid_patch_leaves_item_untouched() {
        let item = truffles();
        let before = item.clone();
        let patch = SweetPatch {
            name: Some(" ".to_string()),
            quantity: Some(1),
            ..SweetPatch::default()
        };
        assert!(item.patched(&patch).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn price_displays_as_currency() {
        assert_eq!(Price::from_cents(250).to_string(), "2.50");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::from_cents(1200).to_string(), "12.00");
    }

    #[test]
    fn blank_description_is_dropped_on_create() {
        let item = SweetItem::create(
            SweetId::new(),
            NewSweet::new("Mints", "Hard Candy", Price::from_cents(50), 10).with_description("  "),
        )
        .unwrap();
        assert_eq!(item.description(), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Purchase(u32),
            Restock(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..200).prop_map(Op::Purchase),
                (0u32..200).prop_map(Op::Restock),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: stock follows exact arithmetic and failed ops never move it.
            #[test]
            fn stock_tracks_successful_ops_exactly(
                initial in 0u32..500,
                ops in prop::collection::vec(op(), 0..50)
            ) {
                let mut item = SweetItem::create(
                    SweetId::new(),
                    NewSweet::new("Gummy", "Gummies", Price::from_cents(125), initial),
                ).unwrap();
                let mut expected = i64::from(initial);

                for op in ops {
                    let before = item.quantity();
                    match op {
                        Op::Purchase(q) => match item.purchase(q) {
                            Ok(()) => expected -= i64::from(q),
                            Err(_) => prop_assert_eq!(item.quantity(), before),
                        },
                        Op::Restock(q) => match item.restock(q) {
                            Ok(()) => expected += i64::from(q),
                            Err(_) => prop_assert_eq!(item.quantity(), before),
                        },
                    }
                    prop_assert!(expected >= 0);
                    prop_assert_eq!(i64::from(item.quantity()), expected);
                }
            }

            /// Property: purchase followed by restock of the same amount is a no-op on stock.
            #[test]
            fn purchase_then_restock_round_trips(stock in 1u32..10_000, pick in 1u32..10_000) {
                let q = pick.min(stock);
                let mut item = SweetItem::create(
                    SweetId::new(),
                    NewSweet::new("Fudge", "Fudge", Price::from_cents(425), stock),
                ).unwrap();

                item.purchase(q).unwrap();
                item.restock(q).unwrap();
                prop_assert_eq!(item.quantity(), stock);
            }
        }
    }
}
