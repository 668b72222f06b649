use serde::{Deserialize, Serialize};

use crate::sweet::{Price, SweetItem};

/// Search criteria. Present criteria are ANDed; absent ones are ignored.
///
/// `name` and `category` are case-insensitive substring matches, price bounds
/// are inclusive. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweetFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl SweetFilter {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_min_price(mut self, price: Price) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn with_max_price(mut self, price: Price) -> Self {
        self.max_price = Some(price);
        self
    }

    /// True when no criterion is set, i.e. the filter matches everything.
    pub fn is_unrestricted(&self) -> bool {
        needle(&self.name).is_none()
            && needle(&self.category).is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    pub fn matches(&self, item: &SweetItem) -> bool {
        if let Some(name) = needle(&self.name) {
            if !contains_ignore_case(item.name(), name) {
                return false;
            }
        }
        if let Some(category) = needle(&self.category) {
            if !contains_ignore_case(item.category(), category) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if item.price() < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if item.price() > max {
                return false;
            }
        }
        true
    }

    /// Keep matching items, preserving their order.
    pub fn apply(&self, items: Vec<SweetItem>) -> Vec<SweetItem> {
        if self.is_unrestricted() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

fn needle(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
