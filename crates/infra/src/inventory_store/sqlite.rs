//! SQLite-backed catalog.
//!
//! Each mutation is a single `UPDATE ... RETURNING` statement, so the
//! read-modify-write happens inside SQLite and concurrent purchases cannot
//! oversell. Insertion order is kept by an autoincrement `position` column.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use sweetshop_core::{DomainError, DomainResult, SweetId};
use sweetshop_inventory::{NewSweet, Price, SweetItem, SweetPatch};

use super::r#trait::InventoryBackend;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sweets (
    position    INTEGER PRIMARY KEY AUTOINCREMENT,
    id          TEXT    NOT NULL UNIQUE,
    name        TEXT    NOT NULL,
    category    TEXT    NOT NULL,
    price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
    quantity    INTEGER NOT NULL CHECK (quantity >= 0),
    description TEXT    NULL
)
"#;

const COLUMNS: &str = "id, name, category, price_cents, quantity, description";

const INSERT: &str = "INSERT INTO sweets (id, name, category, price_cents, quantity, description) \
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// Inserts only into an empty table. Being a write, it takes SQLite's write
/// lock before evaluating `NOT EXISTS`.
const INSERT_IF_EMPTY: &str = "INSERT INTO sweets (id, name, category, price_cents, quantity, description) \
                               SELECT ?1, ?2, ?3, ?4, ?5, ?6 \
                               WHERE NOT EXISTS (SELECT 1 FROM sweets)";

#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Connect to `url` (e.g. `sqlite://sweetshop.db?mode=rwc`) and ensure the schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(storage)?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database.
    ///
    /// Every `sqlite::memory:` connection is its own database, so the pool is
    /// pinned to one connection that never expires.
    pub async fn in_memory() -> DomainResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(storage)?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> DomainResult<Self> {
        sqlx::query(SCHEMA).execute(&pool).await.map_err(storage)?;
        Ok(Self { pool })
    }

    async fn current_quantity(&self, id: SweetId) -> DomainResult<Option<u32>> {
        let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM sweets WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        quantity.map(|q| to_quantity(id, q)).transpose()
    }
}

#[async_trait::async_trait]
impl InventoryBackend for SqliteBackend {
    async fn list(&self) -> DomainResult<Vec<SweetItem>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM sweets ORDER BY position"))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter().map(row_to_item).collect()
    }

    async fn get(&self, id: SweetId) -> DomainResult<SweetItem> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM sweets WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        match row {
            Some(row) => row_to_item(&row),
            None => Err(DomainError::not_found("sweet")),
        }
    }

    async fn insert(&self, item: SweetItem) -> DomainResult<SweetItem> {
        bind_item(sqlx::query(INSERT), &item)?
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, &item))?;
        Ok(item)
    }

    async fn insert_all_if_empty(&self, items: Vec<SweetItem>) -> DomainResult<Vec<SweetItem>> {
        let Some((first, rest)) = items.split_first() else {
            return Ok(Vec::new());
        };

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let guarded = bind_item(sqlx::query(INSERT_IF_EMPTY), first)?
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_error(e, first))?;
        if guarded.rows_affected() == 0 {
            return Ok(Vec::new());
        }

        for item in rest {
            bind_item(sqlx::query(INSERT), item)?
                .execute(&mut *tx)
                .await
                .map_err(|e| insert_error(e, item))?;
        }
        tx.commit().await.map_err(storage)?;
        Ok(items)
    }

    async fn update(&self, id: SweetId, patch: &SweetPatch) -> DomainResult<SweetItem> {
        let price = patch.price.map(to_cents_column).transpose()?;
        // Some("") clears the description; None keeps it.
        let description = patch.description.as_ref().map(|d| {
            if d.trim().is_empty() {
                String::new()
            } else {
                d.clone()
            }
        });

        let row = sqlx::query(&format!(
            "UPDATE sweets SET \
                name = COALESCE(?1, name), \
                category = COALESCE(?2, category), \
                price_cents = COALESCE(?3, price_cents), \
                quantity = COALESCE(?4, quantity), \
                description = CASE WHEN ?5 IS NULL THEN description \
                                   WHEN ?5 = '' THEN NULL \
                                   ELSE ?5 END \
             WHERE id = ?6 \
             RETURNING {COLUMNS}"
        ))
        .bind(patch.name.as_deref())
        .bind(patch.category.as_deref())
        .bind(price)
        .bind(patch.quantity.map(i64::from))
        .bind(description)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match row {
            Some(row) => row_to_item(&row),
            None => Err(DomainError::not_found("sweet")),
        }
    }

    async fn delete(&self, id: SweetId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM sweets WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("sweet"));
        }
        Ok(())
    }

    async fn purchase(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        let row = sqlx::query(&format!(
            "UPDATE sweets SET quantity = quantity - ?1 \
             WHERE id = ?2 AND quantity >= ?1 \
             RETURNING {COLUMNS}"
        ))
        .bind(i64::from(quantity))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        if let Some(row) = row {
            return row_to_item(&row);
        }
        match self.current_quantity(id).await? {
            None => Err(DomainError::not_found("sweet")),
            Some(available) => Err(DomainError::InsufficientStock {
                requested: quantity,
                available,
            }),
        }
    }

    async fn restock(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        let row = sqlx::query(&format!(
            "UPDATE sweets SET quantity = quantity + ?1 \
             WHERE id = ?2 AND quantity + ?1 <= ?3 \
             RETURNING {COLUMNS}"
        ))
        .bind(i64::from(quantity))
        .bind(id.to_string())
        .bind(i64::from(u32::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        if let Some(row) = row {
            return row_to_item(&row);
        }
        match self.current_quantity(id).await? {
            None => Err(DomainError::not_found("sweet")),
            Some(_) => Err(DomainError::validation(
                "restock would overflow the stock counter",
            )),
        }
    }
}

fn bind_item<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    item: &'q SweetItem,
) -> DomainResult<Query<'q, Sqlite, SqliteArguments<'q>>> {
    Ok(query
        .bind(item.id_typed().to_string())
        .bind(item.name())
        .bind(item.category())
        .bind(to_cents_column(item.price())?)
        .bind(i64::from(item.quantity()))
        .bind(item.description()))
}

fn insert_error(err: sqlx::Error, item: &SweetItem) -> DomainError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            DomainError::conflict(format!("sweet {} already exists", item.id_typed()))
        }
        other => storage(other),
    }
}

fn row_to_item(row: &SqliteRow) -> DomainResult<SweetItem> {
    let id: String = row.try_get("id").map_err(storage)?;
    let id: SweetId = id
        .parse()
        .map_err(|e| DomainError::storage(format!("corrupt sweet id: {e}")))?;
    let price: i64 = row.try_get("price_cents").map_err(storage)?;
    let quantity: i64 = row.try_get("quantity").map_err(storage)?;

    let price = u64::try_from(price)
        .map_err(|_| DomainError::storage(format!("negative price stored for sweet {id}")))?;

    Ok(SweetItem::rehydrate(
        id,
        NewSweet {
            name: row.try_get("name").map_err(storage)?,
            category: row.try_get("category").map_err(storage)?,
            price: Price::from_cents(price),
            quantity: to_quantity(id, quantity)?,
            description: row.try_get("description").map_err(storage)?,
        },
    ))
}

fn to_quantity(id: SweetId, quantity: i64) -> DomainResult<u32> {
    u32::try_from(quantity)
        .map_err(|_| DomainError::storage(format!("out-of-range quantity stored for sweet {id}")))
}

fn to_cents_column(price: Price) -> DomainResult<i64> {
    i64::try_from(price.cents()).map_err(|_| DomainError::validation("price is too large"))
}

fn storage(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "sqlite inventory backend failure");
    DomainError::storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweet(name: &str, quantity: u32) -> SweetItem {
        SweetItem::create(
            SweetId::new(),
            NewSweet::new(name, "Fudge", Price::from_cents(425), quantity)
                .with_description("Smooth caramel fudge."),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let item = backend.insert(sweet("Caramel Fudge", 30)).await.unwrap();

        let loaded = backend.get(item.id_typed()).await.unwrap();
        assert_eq!(loaded, item);
        assert_eq!(backend.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_in_insertion_order() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let first = backend.insert(sweet("z", 1)).await.unwrap();
        let second = backend.insert(sweet("a", 1)).await.unwrap();

        let ids: Vec<SweetId> = backend.list().await.unwrap().iter().map(|i| i.id_typed()).collect();
        assert_eq!(ids, vec![first.id_typed(), second.id_typed()]);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_conflict() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let item = sweet("Caramel Fudge", 30);
        backend.insert(item.clone()).await.unwrap();
        assert!(matches!(
            backend.insert(item).await.unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn bulk_insert_only_into_empty_table() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let inserted = backend
            .insert_all_if_empty(vec![sweet("Fudge", 1), sweet("Toffee", 2)])
            .await
            .unwrap();
        assert_eq!(inserted.len(), 2);

        let skipped = backend.insert_all_if_empty(vec![sweet("Nougat", 3)]).await.unwrap();
        assert!(skipped.is_empty());

        let names: Vec<String> = backend.list().await.unwrap().iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["Fudge", "Toffee"]);
    }

    #[tokio::test]
    async fn purchase_and_restock() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let id = backend.insert(sweet("Truffles", 50)).await.unwrap().id_typed();

        assert_eq!(backend.purchase(id, 10).await.unwrap().quantity(), 40);
        assert_eq!(
            backend.purchase(id, 41).await.unwrap_err(),
            DomainError::InsufficientStock {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(backend.get(id).await.unwrap().quantity(), 40);
        assert_eq!(backend.restock(id, 5).await.unwrap().quantity(), 45);
    }

    #[tokio::test]
    async fn restock_overflow_is_rejected() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let id = backend.insert(sweet("Truffles", 1)).await.unwrap().id_typed();

        let err = backend.restock(id, u32::MAX).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(backend.get(id).await.unwrap().quantity(), 1);
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let item = backend.insert(sweet("Caramel Fudge", 30)).await.unwrap();

        let patch = SweetPatch {
            name: Some("Salted Caramel Fudge".to_string()),
            ..SweetPatch::default()
        };
        let updated = backend.update(item.id_typed(), &patch).await.unwrap();

        assert_eq!(updated.name(), "Salted Caramel Fudge");
        assert_eq!(updated.category(), item.category());
        assert_eq!(updated.price(), item.price());
        assert_eq!(updated.quantity(), item.quantity());
        assert_eq!(updated.description(), item.description());
    }

    #[tokio::test]
    async fn update_can_clear_description() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let item = backend.insert(sweet("Caramel Fudge", 30)).await.unwrap();

        let patch = SweetPatch {
            description: Some("  ".to_string()),
            ..SweetPatch::default()
        };
        let updated = backend.update(item.id_typed(), &patch).await.unwrap();
        assert_eq!(updated.description(), None);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let id = SweetId::new();
        let not_found = DomainError::not_found("sweet");

        assert_eq!(backend.get(id).await.unwrap_err(), not_found);
        assert_eq!(backend.delete(id).await.unwrap_err(), not_found);
        assert_eq!(backend.purchase(id, 1).await.unwrap_err(), not_found);
        assert_eq!(backend.restock(id, 1).await.unwrap_err(), not_found);
        assert_eq!(
            backend.update(id, &SweetPatch::default()).await.unwrap_err(),
            not_found
        );
    }
}
