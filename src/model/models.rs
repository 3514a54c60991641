//! Consolidated database models
//!
//! All database entity structs organized by domain sections.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::PositionStatus;

// =============================================================================
// POSITION DOMAIN
// =============================================================================

#[derive(Debug, FromRow, Deserialize, Serialize, Clone)]
pub struct Position {
    pub id: i64,
    pub visual_id: String,
    pub ticker: String,
    pub option_type: String,
    pub direction: String,
    pub strike: BigDecimal,
    pub entry_price: BigDecimal,
    pub quantity: i32,
    pub quantity_closed: i32,
    pub status: String,
    pub open_date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
    pub close_price: Option<BigDecimal>,
    pub open_value: Option<BigDecimal>,
    pub close_value: Option<BigDecimal>,
    pub result: Option<BigDecimal>,
    pub margin: BigDecimal,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub child_ids: Vec<i64>,
}

impl Position {
    /// Contracts still open on this record. Partial closes reduce
    /// `quantity` to the remainder, so an open or partially closed record
    /// holds its remainder there; a closed record has none.
    pub fn remaining_quantity(&self) -> i32 {
        if self.status == PositionStatus::Closed.to_string() {
            return 0;
        }

        self.quantity
    }

    /// Quantity the record was opened with, before any split reduced it.
    /// Only meaningful while the record is still open: a full close resets
    /// `quantity` to the original amount itself.
    pub fn original_quantity(&self) -> i32 {
        self.quantity + self.quantity_closed
    }
}

/// Fields of a split-off closed slice, built by the close handler and
/// inserted by the DAO (which assigns id and visual id).
#[derive(Debug, Clone)]
pub struct New_Position_Slice {
    pub ticker: String,
    pub option_type: String,
    pub direction: String,
    pub strike: BigDecimal,
    pub entry_price: BigDecimal,
    pub quantity: i32,
    pub open_date: DateTime<Utc>,
    pub close_date: DateTime<Utc>,
    pub close_price: BigDecimal,
    pub open_value: BigDecimal,
    pub close_value: BigDecimal,
    pub result: BigDecimal,
    pub margin: BigDecimal,
    pub user_id: i64,
    pub parent_id: i64,
}

// =============================================================================
// USER DOMAIN
// =============================================================================

#[derive(Debug, FromRow, Deserialize, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: String,
    pub margin_limit: BigDecimal,
    pub margin_used: BigDecimal,
    pub plan: Option<String>,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub last_payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// BILLING DOMAIN
// =============================================================================

#[derive(Debug, FromRow, Deserialize, Serialize, Clone)]
pub struct Subscription_Charge {
    pub id: i64,
    pub user_id: i64,
    pub plan: String,
    pub amount: BigDecimal,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
    pub settled: bool,
}

#[derive(Debug, FromRow, Deserialize, Serialize, Clone)]
pub struct Accounting_Report {
    pub id: i64,
    pub closed_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub monthly_count: i64,
    pub monthly_total: BigDecimal,
    pub quarterly_count: i64,
    pub quarterly_total: BigDecimal,
    pub yearly_count: i64,
    pub yearly_total: BigDecimal,
    pub gross: BigDecimal,
    pub tax: BigDecimal,
    pub net: BigDecimal,
}
