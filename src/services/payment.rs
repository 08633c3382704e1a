//! Simulated checkout. No gateway is contacted: the request waits for the
//! configured processing delay and then books the seats as paid.

use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, BookingStatus, PaymentMethod},
    services::booking::{self, BookingRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub method: PaymentMethod,
    pub amount: f64,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub booking: Booking,
    pub payment: PaymentReceipt,
}

pub fn transaction_id() -> String {
    format!("TXN-{}", Uuid::new_v4())
}

pub async fn checkout(
    pool: &SqlitePool,
    user_id: i64,
    processing_delay: Duration,
    mut request: BookingRequest,
) -> AppResult<Checkout> {
    let method = request
        .payment_method
        .ok_or_else(|| AppError::validation("Payment method is required"))?;
    request.status = Some(BookingStatus::Confirmed);

    if !processing_delay.is_zero() {
        tokio::time::sleep(processing_delay).await;
    }

    let booking = booking::create(pool, user_id, request).await?;
    let payment = PaymentReceipt {
        method,
        amount: booking.total_price,
        transaction_id: transaction_id(),
        status: PaymentStatus::Completed,
    };
    info!(
        "Payment {} of {:.2} via {:?} completed for booking {}",
        payment.transaction_id, payment.amount, method, booking.booking_code
    );
    Ok(Checkout { booking, payment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::user::{NewUser, Role, User};

    fn checkout_body(method: Option<&str>) -> BookingRequest {
        let mut body = serde_json::json!({
            "movieId": "550",
            "showtimeId": "550-room-3-2024-05-01-0",
            "roomId": "room-3",
            "seats": [{"id": "A1"}, {"id": "C1"}],
            "status": "pending"
        });
        if let Some(m) = method {
            body["paymentMethod"] = serde_json::json!(m);
        }
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn checkout_confirms_and_issues_transaction() {
        let db = Database::in_memory().await.unwrap();
        let uid = User::create(
            &db.pool,
            NewUser { email: "p@example.com", password_hash: "h", first_name: None, last_name: None, phone: None, role: Role::User },
        )
        .await
        .unwrap()
        .id;

        let result = checkout(&db.pool, uid, Duration::ZERO, checkout_body(Some("bank_transfer"))).await.unwrap();
        assert_eq!(result.booking.status, BookingStatus::Confirmed);
        assert_eq!(result.booking.payment_method, Some(PaymentMethod::BankTransfer));
        // premium room: A1 at 450, C1 at 400, plus the service fee
        assert_eq!(result.payment.amount, 900.0);
        assert!(result.payment.transaction_id.starts_with("TXN-"));

        let json = serde_json::to_value(&result.payment).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["method"], "bank_transfer");
    }

    #[tokio::test]
    async fn checkout_requires_a_method() {
        let db = Database::in_memory().await.unwrap();
        let err = checkout(&db.pool, 1, Duration::ZERO, checkout_body(None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
