use serde::{Deserialize, Serialize};

use sweetshop_inventory::{InventorySummary, NewSweet, Price, SweetFilter, SweetItem, SweetPatch};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSweetRequest {
    pub name: String,
    pub category: String,
    /// Cents.
    pub price: u64,
    pub quantity: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateSweetRequest> for NewSweet {
    fn from(body: CreateSweetRequest) -> Self {
        let sweet = NewSweet::new(body.name, body.category, Price::from_cents(body.price), body.quantity);
        match body.description {
            Some(description) => sweet.with_description(description),
            None => sweet,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSweetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<u64>,
    pub quantity: Option<u32>,
    pub description: Option<String>,
}

impl From<UpdateSweetRequest> for SweetPatch {
    fn from(body: UpdateSweetRequest) -> Self {
        SweetPatch {
            name: body.name,
            category: body.category,
            price: body.price.map(Price::from_cents),
            quantity: body.quantity,
            description: body.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StockChangeRequest {
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

impl From<SearchQuery> for SweetFilter {
    fn from(query: SearchQuery) -> Self {
        SweetFilter {
            name: query.name,
            category: query.category,
            min_price: query.min_price.map(Price::from_cents),
            max_price: query.max_price.map(Price::from_cents),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SweetResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: u64,
    pub quantity: u32,
    pub description: Option<String>,
    pub stock_status: &'static str,
}

impl From<&SweetItem> for SweetResponse {
    fn from(item: &SweetItem) -> Self {
        Self {
            id: item.id_typed().to_string(),
            name: item.name().to_string(),
            category: item.category().to_string(),
            price: item.price().cents(),
            quantity: item.quantity(),
            description: item.description().map(str::to_string),
            stock_status: item.stock_status().as_str(),
        }
    }
}

pub fn sweets_to_json(items: &[SweetItem]) -> Vec<SweetResponse> {
    items.iter().map(SweetResponse::from).collect()
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_items: usize,
    pub total_units: u64,
    pub total_value: u64,
    pub out_of_stock: usize,
    pub low_stock: usize,
}

impl From<InventorySummary> for SummaryResponse {
    fn from(summary: InventorySummary) -> Self {
        Self {
            total_items: summary.total_items,
            total_units: summary.total_units,
            total_value: summary.total_value,
            out_of_stock: summary.out_of_stock,
            low_stock: summary.low_stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetshop_core::SweetId;

    #[test]
    fn item_json_carries_cents_and_stock_status() {
        let item = SweetItem::create(
            SweetId::new(),
            NewSweet::new("Vanilla Cupcakes", "Pastries", Price::from_cents(375), 8),
        )
        .unwrap();

        let json = serde_json::to_value(SweetResponse::from(&item)).unwrap();
        assert_eq!(json["price"], 375);
        assert_eq!(json["stock_status"], "low_stock");
        assert!(json["description"].is_null());
    }

    #[test]
    fn update_request_rejects_id_field() {
        let parsed: Result<UpdateSweetRequest, _> =
            serde_json::from_value(serde_json::json!({ "id": "x", "name": "New" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn search_query_maps_to_filter() {
        let filter: SweetFilter = SearchQuery {
            category: Some("gummies".into()),
            min_price: Some(100),
            ..SearchQuery::default()
        }
        .into();
        assert_eq!(filter.category.as_deref(), Some("gummies"));
        assert_eq!(filter.min_price, Some(Price::from_cents(100)));
        assert!(filter.name.is_none());
    }
}
