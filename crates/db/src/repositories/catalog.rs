use sqlx::{QueryBuilder, Sqlite};

use modista_core::domain::product::{CatalogFilter, NewProduct, Product};

use super::{unix_now, CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    sku: String,
    title: String,
    description: String,
    color: String,
    size: String,
    price: f64,
    currency: String,
    url: String,
    photo_url: String,
    created_at: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            sku: row.sku,
            title: row.title,
            description: row.description,
            color: row.color,
            size: row.size,
            price: row.price,
            currency: row.currency,
            url: row.url,
            photo_url: row.photo_url,
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn upsert(&self, product: NewProduct) -> Result<(), RepositoryError> {
        // created_at is stamped once; a conflicting sku keeps the original
        // stamp while every mutable field takes the incoming value.
        sqlx::query(
            "INSERT INTO products \
               (sku, title, description, color, size, price, currency, url, photo_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(sku) DO UPDATE SET \
               title = excluded.title, \
               description = excluded.description, \
               color = excluded.color, \
               size = excluded.size, \
               price = excluded.price, \
               currency = excluded.currency, \
               url = excluded.url, \
               photo_url = excluded.photo_url",
        )
        .bind(&product.sku)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.color)
        .bind(&product.size)
        .bind(product.price)
        .bind(&product.currency)
        .bind(&product.url)
        .bind(&product.photo_url)
        .bind(unix_now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn search(&self, filter: &CatalogFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT sku, title, description, color, size, price, currency, url, photo_url, \
             created_at FROM products WHERE 1 = 1",
        );

        if !filter.query.is_empty() {
            let pattern = like_pattern(&filter.query);
            builder.push(" AND (title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR sku LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(color) = non_empty(filter.color.as_deref()) {
            builder.push(" AND color LIKE ");
            builder.push_bind(like_pattern(color));
        }

        if let Some(size) = non_empty(filter.size.as_deref()) {
            builder.push(" AND size LIKE ");
            builder.push_bind(like_pattern(size));
        }

        // rowid breaks ties within the same second so insertion order wins.
        builder.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        builder.push_bind(i64::from(filter.limit));

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

fn like_pattern(value: &str) -> String {
    format!("%{value}%")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use modista_core::domain::product::{CatalogFilter, NewProduct};

    use super::SqlCatalogRepository;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    fn hoodie(sku: &str, title: &str, color: &str, price: f64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            title: title.to_string(),
            description: "warm fleece hoodie".to_string(),
            color: color.to_string(),
            size: "M".to_string(),
            price,
            currency: "USD".to_string(),
            url: String::new(),
            photo_url: String::new(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_sku() {
        let pool = pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.upsert(hoodie("H-1", "Winter Hoodie", "black", 49.0)).await.expect("first upsert");
        repo.upsert(hoodie("H-1", "Winter Hoodie v2", "navy", 55.0)).await.expect("second upsert");

        let rows = repo.search(&CatalogFilter::default()).await.expect("search");
        assert_eq!(rows.len(), 1, "re-inserting the same sku must not create a second row");
        assert_eq!(rows[0].title, "Winter Hoodie v2");
        assert_eq!(rows[0].color, "navy");
        assert_eq!(rows[0].price, 55.0);

        pool.close().await;
    }

    #[tokio::test]
    async fn search_filters_by_color() {
        let pool = pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.upsert(hoodie("H-B", "Hoodie", "black", 49.0)).await.expect("upsert black");
        repo.upsert(hoodie("H-W", "Hoodie", "white", 49.0)).await.expect("upsert white");

        let filter = CatalogFilter { color: Some("black".to_string()), ..CatalogFilter::default() };
        let rows = repo.search(&filter).await.expect("search");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "H-B");

        pool.close().await;
    }

    #[tokio::test]
    async fn search_matches_query_against_title_description_and_sku() {
        let pool = pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        repo.upsert(hoodie("H-1", "Winter Hoodie", "black", 49.0)).await.expect("upsert");
        repo.upsert(NewProduct {
            sku: "T-9".to_string(),
            title: "Linen Shirt".to_string(),
            description: "light summer shirt".to_string(),
            color: "white".to_string(),
            size: "L".to_string(),
            price: 29.0,
            currency: "USD".to_string(),
            url: String::new(),
            photo_url: String::new(),
        })
        .await
        .expect("upsert shirt");

        let filter = CatalogFilter { query: "hoodie".to_string(), ..CatalogFilter::default() };
        let rows = repo.search(&filter).await.expect("title match");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "H-1");

        let filter = CatalogFilter { query: "T-9".to_string(), ..CatalogFilter::default() };
        let rows = repo.search(&filter).await.expect("sku match");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "T-9");

        pool.close().await;
    }

    #[tokio::test]
    async fn search_returns_most_recent_first_and_honors_limit() {
        let pool = pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());

        for i in 0..4 {
            repo.upsert(hoodie(&format!("H-{i}"), "Hoodie", "black", 40.0 + f64::from(i)))
                .await
                .expect("upsert");
        }

        let filter = CatalogFilter { limit: 2, ..CatalogFilter::default() };
        let rows = repo.search(&filter).await.expect("search");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku, "H-3", "newest row should come first");
        assert_eq!(rows[1].sku, "H-2");

        pool.close().await;
    }
}
