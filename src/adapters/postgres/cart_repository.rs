//! PostgreSQL implementation of CartRepository.
//!
//! Status changes are a single `UPDATE ... WHERE payment_status = $expected`
//! so two concurrent completions cannot both apply. The signup token column
//! is only ever written while it is NULL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::cart::{
    AppliedCoupon, BillingCycle, Cart, Gateway, PaymentRecord, PaymentStatus, PlanName,
    Subscription, UserDetails,
};
use crate::domain::foundation::{
    CartId, Currency, DomainError, ErrorCode, Money, PaymentId, Timestamp, UserId,
    ValidationError,
};
use crate::ports::{CartRepository, CasOutcome};

const CART_COLUMNS: &str = "id, user_id, user_details, plan, plan_amount, currency, \
    billing_cycle, is_active, start_date, end_date, gateway, payment_id, gateway_order_id, \
    transaction_id, payment_method, total_amount, payment_status, coupon_code, discount_amount, \
    signup_token, token_expiry, is_signup_completed, signup_completed_at, created_at, updated_at";

/// PostgreSQL implementation of the CartRepository port.
pub struct PostgresCartRepository {
    pool: PgPool,
}

impl PostgresCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a cart.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Option<String>,
    user_details: Json<UserDetails>,
    plan: String,
    plan_amount: i64,
    currency: String,
    billing_cycle: String,
    is_active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    gateway: String,
    payment_id: String,
    gateway_order_id: Option<String>,
    transaction_id: Option<String>,
    payment_method: Option<String>,
    total_amount: i64,
    payment_status: String,
    coupon_code: Option<String>,
    discount_amount: Option<i64>,
    signup_token: Option<String>,
    token_expiry: Option<DateTime<Utc>>,
    is_signup_completed: bool,
    signup_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = DomainError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let currency: Currency = parse_column(&row.currency)?;
        let coupon = match (row.coupon_code, row.discount_amount) {
            (Some(code), Some(discount)) => Some(AppliedCoupon {
                code,
                discount_amount: Money::from_minor(discount, currency),
            }),
            _ => None,
        };
        let user_id = row
            .user_id
            .map(UserId::new)
            .transpose()
            .map_err(corrupt_row)?;

        Ok(Cart {
            id: CartId::from_uuid(row.id),
            user_id,
            user: row.user_details.0,
            subscription: Subscription {
                plan: parse_column::<PlanName>(&row.plan)?,
                plan_amount: Money::from_minor(row.plan_amount, currency),
                billing_cycle: parse_column::<BillingCycle>(&row.billing_cycle)?,
                is_active: row.is_active,
                start_date: row.start_date.map(Timestamp::from_datetime),
                end_date: row.end_date.map(Timestamp::from_datetime),
            },
            payment: PaymentRecord {
                gateway: parse_column::<Gateway>(&row.gateway)?,
                payment_id: PaymentId::new(row.payment_id).map_err(corrupt_row)?,
                gateway_order_id: row.gateway_order_id,
                transaction_id: row.transaction_id,
                payment_method: row.payment_method,
                total_amount: Money::from_minor(row.total_amount, currency),
                status: parse_column::<PaymentStatus>(&row.payment_status)?,
            },
            coupon,
            signup_token: row.signup_token,
            token_expiry: row.token_expiry.map(Timestamp::from_datetime),
            is_signup_completed: row.is_signup_completed,
            signup_completed_at: row.signup_completed_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn corrupt_row(err: ValidationError) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", err))
}

fn parse_column<T>(value: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = ValidationError>,
{
    value.parse::<T>().map_err(corrupt_row)
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn save(&self, cart: &Cart) -> Result<(), DomainError> {
        let sql = format!(
            "INSERT INTO carts ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
              $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)",
            CART_COLUMNS
        );

        sqlx::query(&sql)
            .bind(cart.id.as_uuid())
            .bind(cart.user_id.as_ref().map(|u| u.as_str()))
            .bind(Json(&cart.user))
            .bind(cart.subscription.plan.as_str())
            .bind(cart.subscription.plan_amount.minor())
            .bind(cart.subscription.plan_amount.currency().code())
            .bind(cart.subscription.billing_cycle.as_str())
            .bind(cart.subscription.is_active)
            .bind(cart.subscription.start_date.map(|t| *t.as_datetime()))
            .bind(cart.subscription.end_date.map(|t| *t.as_datetime()))
            .bind(cart.payment.gateway.as_str())
            .bind(cart.payment.payment_id.as_str())
            .bind(&cart.payment.gateway_order_id)
            .bind(&cart.payment.transaction_id)
            .bind(&cart.payment.payment_method)
            .bind(cart.payment.total_amount.minor())
            .bind(cart.payment.status.as_str())
            .bind(cart.coupon.as_ref().map(|c| c.code.as_str()))
            .bind(cart.coupon.as_ref().map(|c| c.discount_amount.minor()))
            .bind(&cart.signup_token)
            .bind(cart.token_expiry.map(|t| *t.as_datetime()))
            .bind(cart.is_signup_completed)
            .bind(cart.signup_completed_at.map(|t| *t.as_datetime()))
            .bind(cart.created_at.as_datetime())
            .bind(cart.updated_at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to save cart", e))?;

        Ok(())
    }

    async fn update(&self, cart: &Cart) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                user_id = $2,
                coupon_code = $3,
                discount_amount = $4,
                gateway_order_id = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_ref().map(|u| u.as_str()))
        .bind(cart.coupon.as_ref().map(|c| c.code.as_str()))
        .bind(cart.coupon.as_ref().map(|c| c.discount_amount.minor()))
        .bind(&cart.payment.gateway_order_id)
        .bind(cart.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update cart", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CartNotFound,
                format!("Cart not found: {}", cart.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError> {
        let sql = format!("SELECT {} FROM carts WHERE id = $1", CART_COLUMNS);
        let row: Option<CartRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load cart", e))?;
        row.map(Cart::try_from).transpose()
    }

    async fn find_by_signup_token(&self, token: &str) -> Result<Option<Cart>, DomainError> {
        let sql = format!("SELECT {} FROM carts WHERE signup_token = $1", CART_COLUMNS);
        let row: Option<CartRow> = sqlx::query_as(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load cart by signup token", e))?;
        row.map(Cart::try_from).transpose()
    }

    async fn compare_and_swap_status(
        &self,
        expected: PaymentStatus,
        cart: &Cart,
    ) -> Result<CasOutcome, DomainError> {
        let sql = format!(
            r#"
            UPDATE carts SET
                payment_status = $3,
                transaction_id = $4,
                payment_method = $5,
                gateway_order_id = $6,
                is_active = $7,
                start_date = $8,
                end_date = $9,
                token_expiry = CASE WHEN signup_token IS NULL THEN $11 ELSE token_expiry END,
                signup_token = COALESCE(signup_token, $10),
                updated_at = $12
            WHERE id = $1 AND payment_status = $2
            RETURNING {}
            "#,
            CART_COLUMNS
        );

        let row: Option<CartRow> = sqlx::query_as(&sql)
            .bind(cart.id.as_uuid())
            .bind(expected.as_str())
            .bind(cart.payment.status.as_str())
            .bind(&cart.payment.transaction_id)
            .bind(&cart.payment.payment_method)
            .bind(&cart.payment.gateway_order_id)
            .bind(cart.subscription.is_active)
            .bind(cart.subscription.start_date.map(|t| *t.as_datetime()))
            .bind(cart.subscription.end_date.map(|t| *t.as_datetime()))
            .bind(&cart.signup_token)
            .bind(cart.token_expiry.map(|t| *t.as_datetime()))
            .bind(cart.updated_at.as_datetime())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update cart status", e))?;

        if let Some(row) = row {
            return Ok(CasOutcome::Applied(Cart::try_from(row)?));
        }

        // Zero rows: either the status moved underneath us or the cart is gone.
        match self.find_by_id(&cart.id).await? {
            Some(current) => Ok(CasOutcome::Rejected(current)),
            None => Ok(CasOutcome::NotFound),
        }
    }

    async fn mark_signup_completed(&self, id: &CartId, at: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                is_signup_completed = TRUE,
                signup_completed_at = $2,
                updated_at = $2
            WHERE id = $1 AND is_signup_completed = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to complete signup", e))?;

        Ok(result.rows_affected() == 1)
    }
}
