use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::extractor::ProductRecord;
use crate::sinks::{EXPORT_STEM, RecordSink, SinkError, SinkOutcome};

/// Postgres caps a statement at 65535 bind parameters; 15 per row.
const ROWS_PER_STATEMENT: usize = 1000;

/// Inserts a run's records into `universal_products`, in one transaction.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    pool: PgPool,
    run_id: Uuid,
}

impl PostgresSink {
    pub fn new(pool: PgPool, run_id: Uuid) -> Self {
        Self { pool, run_id }
    }

    pub async fn migrate(&self) -> Result<(), SinkError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SinkError::Database(e.into()))
    }
}

fn insert_statement(
    run_id: Uuid,
    records: &[ProductRecord],
) -> Result<QueryBuilder<'static, Postgres>, SinkError> {
    let indices = records
        .iter()
        .map(|record| {
            i32::try_from(record.index).map_err(|_| SinkError::IndexOutOfRange(record.index))
        })
        .collect::<Result<Vec<i32>, _>>()?;

    let mut builder = QueryBuilder::new(format!(
        r#"INSERT INTO {EXPORT_STEM} (run_id, "index", search_query, name, current_price, original_price, rating, reviews, discount, offers, image_url, delivery, availability, site, scraped_at) "#
    ));
    builder.push_values(records.iter().zip(indices), |mut row, (record, index)| {
        let fields = record.to_row();
        row.push_bind(run_id)
            .push_bind(index)
            .push_bind(fields.search_query)
            .push_bind(fields.name)
            .push_bind(fields.current_price)
            .push_bind(fields.original_price)
            .push_bind(fields.rating)
            .push_bind(fields.reviews)
            .push_bind(fields.discount)
            .push_bind(fields.offers)
            .push_bind(fields.image_url)
            .push_bind(fields.delivery)
            .push_bind(fields.availability)
            .push_bind(fields.site)
            .push_bind(record.scraped_at);
    });
    Ok(builder)
}

#[async_trait]
impl RecordSink for PostgresSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn write(&self, records: &[ProductRecord]) -> Result<SinkOutcome, SinkError> {
        if records.is_empty() {
            return Ok(SinkOutcome::Skipped);
        }

        let mut tx = self.pool.begin().await?;
        let mut rows = 0;
        for chunk in records.chunks(ROWS_PER_STATEMENT) {
            let result = insert_statement(self.run_id, chunk)?
                .build()
                .execute(&mut *tx)
                .await?;
            rows += result.rows_affected() as usize;
        }
        tx.commit().await?;

        Ok(SinkOutcome::Written {
            rows,
            location: EXPORT_STEM.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tiers::emergency::placeholder;

    #[test]
    fn test_insert_statement_shape() {
        let records = vec![
            placeholder("<title>a</title>", 1),
            placeholder("<title>b</title>", 2),
        ];
        let builder = insert_statement(Uuid::new_v4(), &records).unwrap();
        let sql = builder.sql();

        assert!(sql.starts_with(r#"INSERT INTO universal_products (run_id, "index","#));
        assert!(sql.contains("$30"));
        assert!(!sql.contains("$31"));
    }

    #[test]
    fn test_index_beyond_column_range_is_an_error() {
        let mut record = placeholder("<title>a</title>", 1);
        record.index = i32::MAX as usize + 1;

        let result = insert_statement(Uuid::new_v4(), &[record]);
        assert!(matches!(
            result,
            Err(SinkError::IndexOutOfRange(index)) if index == i32::MAX as usize + 1
        ));
    }

    async fn setup_test_db() -> Option<PgPool> {
        // Skip tests if TEST_DATABASE_URL is not set
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("Skipping database tests: TEST_DATABASE_URL not set");
                return None;
            }
        };

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        Some(pool)
    }

    #[tokio::test]
    async fn test_write_inserts_every_record() {
        let Some(pool) = setup_test_db().await else {
            return; // Skip test if database not available
        };
        let run_id = Uuid::new_v4();
        let sink = PostgresSink::new(pool.clone(), run_id);
        sink.migrate().await.expect("Failed to run migrations");

        let records = vec![
            placeholder("<title>a</title>", 1),
            placeholder("<title>b</title>", 2),
        ];
        let outcome = sink.write(&records).await.unwrap();
        assert!(matches!(outcome, SinkOutcome::Written { rows: 2, .. }));

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM universal_products WHERE run_id = $1")
                .bind(run_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_write_skips_empty_runs() {
        let Some(pool) = setup_test_db().await else {
            return;
        };
        let sink = PostgresSink::new(pool, Uuid::new_v4());
        assert_eq!(sink.write(&[]).await.unwrap(), SinkOutcome::Skipped);
    }
}
