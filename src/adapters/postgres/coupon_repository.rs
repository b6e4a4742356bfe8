//! PostgreSQL implementation of CouponRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::coupon::{Coupon, CouponKind};
use crate::domain::foundation::{Currency, DomainError, ErrorCode, Timestamp};
use crate::ports::CouponRepository;

pub struct PostgresCouponRepository {
    pool: PgPool,
}

impl PostgresCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    code: String,
    kind: String,
    value: i64,
    max_discount: Option<i64>,
    min_order_amount: Option<i64>,
    currency: Option<String>,
    start_date: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    usage_limit: Option<i32>,
    used_count: i32,
    is_active: bool,
}

fn invalid(message: String) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, message)
}

fn parse_kind(kind: &str, value: i64) -> Result<CouponKind, DomainError> {
    match kind {
        "percentage" => u8::try_from(value)
            .ok()
            .filter(|p| (1..=100).contains(p))
            .map(|percent| CouponKind::Percentage { percent })
            .ok_or_else(|| invalid(format!("Invalid percentage value: {}", value))),
        "fixed_amount" => Ok(CouponKind::FixedAmount { amount: value }),
        other => Err(invalid(format!("Invalid coupon kind: {}", other))),
    }
}

fn non_negative(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| invalid(format!("Negative {}: {}", column, value)))
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let currency = row
            .currency
            .map(|c| c.parse::<Currency>())
            .transpose()
            .map_err(|e| invalid(format!("Invalid currency: {}", e)))?;

        Ok(Coupon {
            code: row.code,
            kind: parse_kind(&row.kind, row.value)?,
            max_discount: row.max_discount,
            min_order_amount: row.min_order_amount,
            currency,
            start_date: Timestamp::from_datetime(row.start_date),
            expires_at: Timestamp::from_datetime(row.expires_at),
            usage_limit: row
                .usage_limit
                .map(|l| non_negative(l, "usage_limit"))
                .transpose()?,
            used_count: non_negative(row.used_count, "used_count")?,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl CouponRepository for PostgresCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT code, kind, value, max_discount, min_order_amount, currency,
                   start_date, expires_at, usage_limit, used_count, is_active
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(Coupon::normalize_code(code))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| invalid(format!("Failed to load coupon: {}", e)))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn record_redemption(&self, code: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET used_count = used_count + 1
            WHERE code = $1 AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(Coupon::normalize_code(code))
        .execute(&self.pool)
        .await
        .map_err(|e| invalid(format!("Failed to record coupon redemption: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, value: i64) -> CouponRow {
        let now = Utc::now();
        CouponRow {
            code: "SAVE20".into(),
            kind: kind.into(),
            value,
            max_discount: Some(5_000),
            min_order_amount: None,
            currency: Some("INR".into()),
            start_date: now - chrono::Duration::days(1),
            expires_at: now + chrono::Duration::days(1),
            usage_limit: Some(10),
            used_count: 3,
            is_active: true,
        }
    }

    #[test]
    fn percentage_row_converts() {
        let coupon = Coupon::try_from(row("percentage", 20)).unwrap();
        assert_eq!(coupon.kind, CouponKind::Percentage { percent: 20 });
        assert_eq!(coupon.currency, Some(Currency::Inr));
        assert_eq!(coupon.usage_limit, Some(10));
        assert_eq!(coupon.used_count, 3);
    }

    #[test]
    fn fixed_amount_row_converts() {
        let coupon = Coupon::try_from(row("fixed_amount", 10_000)).unwrap();
        assert_eq!(coupon.kind, CouponKind::FixedAmount { amount: 10_000 });
    }

    #[test]
    fn out_of_range_percentage_is_rejected() {
        assert!(Coupon::try_from(row("percentage", 150)).is_err());
        assert!(Coupon::try_from(row("percentage", 0)).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Coupon::try_from(row("bogo", 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
