//! # Bundle Repository
//!
//! Reads and writes bundle definitions. This is the catalog fetch boundary:
//! every row leaving this module has been parsed and validated, so the
//! discount engine never sees an unknown discount type.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_active(now)                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bundles WHERE is_active AND valid_from <= now                         │
//! │               AND (valid_until IS NULL OR valid_until >= now)          │
//! │  ORDER BY created_at, rowid         ← catalog order = tie-break order  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bundle_members for those bundles, ORDER BY position                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BundleRow ──parse + validate──► BundleDefinition                      │
//! │                 │                                                       │
//! │                 └── bad row ──► DbError::InvalidBundle                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use bundle_core::validation::validate_bundle;
use bundle_core::{BundleDefinition, BundleMember, DiscountType, ValidationError};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct BundleRow {
    id: String,
    name: String,
    discount_type: String,
    discount_value: i64,
    min_quantity: i64,
    max_quantity: Option<i64>,
    is_active: bool,
    valid_from: i64,
    valid_until: Option<i64>,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    bundle_id: String,
    product_id: String,
    required_quantity: i64,
    is_required: bool,
}

impl From<MemberRow> for BundleMember {
    fn from(row: MemberRow) -> Self {
        BundleMember {
            product_id: row.product_id,
            required_quantity: row.required_quantity,
            is_required: row.is_required,
        }
    }
}

fn timestamp(id: &str, field: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        DbError::invalid_bundle(
            id,
            ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("{} is not a valid timestamp", millis),
            },
        )
    })
}

impl BundleRow {
    fn into_definition(self, members: Vec<BundleMember>) -> DbResult<BundleDefinition> {
        let discount_type: DiscountType = self
            .discount_type
            .parse()
            .map_err(|e| DbError::invalid_bundle(&self.id, e))?;

        let valid_from = timestamp(&self.id, "valid_from", self.valid_from)?;
        let valid_until = self
            .valid_until
            .map(|ms| timestamp(&self.id, "valid_until", ms))
            .transpose()?;

        let bundle = BundleDefinition {
            id: self.id,
            name: self.name,
            discount_type,
            discount_value: self.discount_value,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            is_active: self.is_active,
            valid_from,
            valid_until,
            members,
        };

        validate_bundle(&bundle).map_err(|e| DbError::invalid_bundle(&bundle.id, e))?;
        Ok(bundle)
    }
}

const BUNDLE_COLUMNS: &str = r#"
    id, name, discount_type, discount_value, min_quantity, max_quantity,
    is_active, valid_from, valid_until
"#;

const ACTIVE_FILTER: &str = r#"
    is_active = 1
    AND valid_from <= ?1
    AND (valid_until IS NULL OR valid_until >= ?1)
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for bundle catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.bundles();
/// repo.insert(&bundle).await?;
/// let live = repo.list_active(Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BundleRepository {
    pool: SqlitePool,
}

impl BundleRepository {
    /// Creates a new BundleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BundleRepository { pool }
    }

    /// Lists bundles that are active and inside their validity window at
    /// `now`, in catalog (insertion) order.
    ///
    /// Fails with [`DbError::InvalidBundle`] if any live row is malformed;
    /// a quote must not silently drop a promotion the seller configured.
    pub async fn list_active(&self, now: DateTime<Utc>) -> DbResult<Vec<BundleDefinition>> {
        let now_ms = now.timestamp_millis();
        debug!(now = %now, "Listing active bundles");

        let rows: Vec<BundleRow> = sqlx::query_as::<_, BundleRow>(&format!(
            "SELECT {} FROM bundles WHERE {} ORDER BY created_at, rowid",
            BUNDLE_COLUMNS, ACTIVE_FILTER
        ))
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        let member_rows: Vec<MemberRow> = sqlx::query_as::<_, MemberRow>(&format!(
            r#"
            SELECT bundle_id, product_id, required_quantity, is_required
            FROM bundle_members
            WHERE bundle_id IN (SELECT id FROM bundles WHERE {})
            ORDER BY bundle_id, position
            "#,
            ACTIVE_FILTER
        ))
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        let mut members: HashMap<String, Vec<BundleMember>> = HashMap::new();
        for row in member_rows {
            members
                .entry(row.bundle_id.clone())
                .or_default()
                .push(row.into());
        }

        let bundles = rows
            .into_iter()
            .map(|row| {
                let row_members = members.remove(&row.id).unwrap_or_default();
                row.into_definition(row_members)
            })
            .collect::<DbResult<Vec<_>>>()
            .inspect_err(|e| warn!(error = %e, "Rejected malformed bundle row"))?;

        debug!(count = bundles.len(), "Active bundles loaded");
        Ok(bundles)
    }

    /// Gets a bundle by ID regardless of state or window.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BundleDefinition>> {
        let row: Option<BundleRow> = sqlx::query_as::<_, BundleRow>(&format!(
            "SELECT {} FROM bundles WHERE id = ?1",
            BUNDLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT bundle_id, product_id, required_quantity, is_required
            FROM bundle_members
            WHERE bundle_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(BundleMember::from)
        .collect();

        row.into_definition(members).map(Some)
    }

    /// Validates and stores a bundle with its members in one transaction.
    ///
    /// Member order is preserved.
    pub async fn insert(&self, bundle: &BundleDefinition) -> DbResult<()> {
        validate_bundle(bundle).map_err(|e| DbError::invalid_bundle(&bundle.id, e))?;

        let now_ms = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bundles (
                id, name, discount_type, discount_value, min_quantity, max_quantity,
                is_active, valid_from, valid_until, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&bundle.id)
        .bind(bundle.name.trim())
        .bind(bundle.discount_type.as_str())
        .bind(bundle.discount_value)
        .bind(bundle.min_quantity)
        .bind(bundle.max_quantity)
        .bind(bundle.is_active)
        .bind(bundle.valid_from.timestamp_millis())
        .bind(bundle.valid_until.map(|t| t.timestamp_millis()))
        .bind(now_ms)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: bundle.id.clone(),
            },
            other => other,
        })?;

        for (position, member) in bundle.members.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bundle_members (
                    bundle_id, position, product_id, required_quantity, is_required
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&bundle.id)
            .bind(position as i64)
            .bind(&member.product_id)
            .bind(member.required_quantity)
            .bind(member.is_required)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            bundle_id = %bundle.id,
            discount_type = %bundle.discount_type,
            members = bundle.members.len(),
            "Bundle stored"
        );
        Ok(())
    }

    /// Switches a bundle on or off.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE bundles SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(active)
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bundle", id));
        }

        debug!(bundle_id = %id, active, "Bundle state changed");
        Ok(())
    }

    /// Deletes a bundle; members cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM bundles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bundle", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn bundle(id: &str, now: DateTime<Utc>) -> BundleDefinition {
        BundleDefinition {
            id: id.to_string(),
            name: format!("Bundle {}", id),
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            min_quantity: 2,
            max_quantity: Some(10),
            is_active: true,
            valid_from: now - Duration::days(1),
            valid_until: Some(now + Duration::days(7)),
            members: vec![
                BundleMember::required("P1", 1),
                BundleMember::required("P2", 1),
                BundleMember::optional("P3", 2),
            ],
        }
    }

    /// Drops sub-millisecond precision the way a round-trip through storage does.
    fn truncate(t: DateTime<Utc>) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = test_db().await;
        let now = Utc::now();
        let mut original = bundle("b1", now);
        original.valid_from = truncate(original.valid_from);
        original.valid_until = original.valid_until.map(truncate);

        db.bundles().insert(&original).await.unwrap();
        let loaded = db.bundles().get_by_id("b1").await.unwrap().unwrap();

        assert_eq!(loaded, original);
        assert!(db.bundles().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_filters_state_and_window() {
        let db = test_db().await;
        let now = Utc::now();
        let repo = db.bundles();

        repo.insert(&bundle("live", now)).await.unwrap();

        let mut inactive = bundle("inactive", now);
        inactive.is_active = false;
        repo.insert(&inactive).await.unwrap();

        let mut expired = bundle("expired", now);
        expired.valid_from = now - Duration::days(10);
        expired.valid_until = Some(now - Duration::days(1));
        repo.insert(&expired).await.unwrap();

        let mut upcoming = bundle("upcoming", now);
        upcoming.valid_from = now + Duration::days(1);
        upcoming.valid_until = None;
        repo.insert(&upcoming).await.unwrap();

        let active = repo.list_active(now).await.unwrap();
        let ids: Vec<&str> = active.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["live"]);
        assert_eq!(active[0].members.len(), 3);
        assert_eq!(active[0].members[2].product_id, "P3");
        assert!(!active[0].members[2].is_required);
    }

    #[tokio::test]
    async fn test_list_active_keeps_catalog_order() {
        let db = test_db().await;
        let now = Utc::now();
        let repo = db.bundles();

        for id in ["c", "a", "b"] {
            repo.insert(&bundle(id, now)).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list_active(now)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_bundle() {
        let db = test_db().await;
        let mut bad = bundle("bad", Utc::now());
        bad.discount_value = 20_000;

        let err = db.bundles().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidBundle { ref id, .. } if id == "bad"));
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let db = test_db().await;
        let b = bundle("dup", Utc::now());
        db.bundles().insert(&b).await.unwrap();

        let err = db.bundles().insert(&b).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "dup"));
    }

    #[tokio::test]
    async fn test_unknown_discount_type_is_reported() {
        let db = test_db().await;
        let now = Utc::now();
        db.bundles().insert(&bundle("good", now)).await.unwrap();

        sqlx::query(
            r#"
            INSERT INTO bundles (
                id, name, discount_type, discount_value, min_quantity,
                is_active, valid_from, created_at, updated_at
            ) VALUES ('legacy', 'Legacy promo', 'free_gift', 1, 1, 1, ?1, ?1, ?1)
            "#,
        )
        .bind((now - Duration::days(1)).timestamp_millis())
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO bundle_members \
             (bundle_id, position, product_id, required_quantity, is_required) \
             VALUES ('legacy', 0, 'P1', 1, 1)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.bundles().list_active(now).await.unwrap_err();
        match err {
            DbError::InvalidBundle { id, source } => {
                assert_eq!(id, "legacy");
                assert!(matches!(source, ValidationError::NotAllowed { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_set_active_and_delete() {
        let db = test_db().await;
        let now = Utc::now();
        let repo = db.bundles();
        repo.insert(&bundle("b1", now)).await.unwrap();

        repo.set_active("b1", false).await.unwrap();
        assert!(repo.list_active(now).await.unwrap().is_empty());

        repo.set_active("b1", true).await.unwrap();
        assert_eq!(repo.list_active(now).await.unwrap().len(), 1);

        assert!(matches!(
            repo.set_active("nope", true).await,
            Err(DbError::NotFound { .. })
        ));

        repo.delete("b1").await.unwrap();
        assert!(repo.get_by_id("b1").await.unwrap().is_none());
        let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bundle_members")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphaned, 0);
    }
}
