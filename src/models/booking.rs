use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{types::Json, FromRow, SqlitePool};

use super::seat::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Gcash,
    Paypal,
    BankTransfer,
    Paymaya,
}

fn id_as_string<S: Serializer>(id: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&id.to_string())
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(serialize_with = "id_as_string")]
    pub id: i64,
    pub user_id: i64,
    pub movie_id: String,
    pub showtime_id: String,
    pub room_id: String,
    pub seats: Json<Vec<Seat>>,
    pub total_price: f64,
    pub status: BookingStatus,
    pub payment_method: Option<PaymentMethod>,
    pub booking_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub movie_id: String,
    pub showtime_id: String,
    pub room_id: String,
    pub seats: Vec<Seat>,
    pub total_price: f64,
    pub status: BookingStatus,
    pub payment_method: Option<PaymentMethod>,
    pub booking_code: String,
}

/// Per-status counts and confirmed revenue for the admin dashboard.
#[derive(Debug, Clone, Default, FromRow)]
pub struct BookingTotals {
    pub total: i64,
    pub confirmed: i64,
    pub pending: i64,
    pub cancelled: i64,
    pub revenue: f64,
}

const BOOKING_COLUMNS: &str = "id, user_id, movie_id, showtime_id, room_id, seats, total_price, \
     status, payment_method, booking_code, created_at, updated_at";

impl Booking {
    pub async fn insert(pool: &SqlitePool, new: &NewBooking) -> Result<Booking, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (user_id, movie_id, showtime_id, room_id, seats, total_price,
                                   status, payment_method, booking_code, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(&new.movie_id)
        .bind(&new.showtime_id)
        .bind(&new.room_id)
        .bind(Json(&new.seats))
        .bind(new.total_price)
        .bind(new.status)
        .bind(new.payment_method)
        .bind(&new.booking_code)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn code_exists(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_code = ?)")
            .bind(code)
            .fetch_one(pool)
            .await
    }

    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: BookingStatus,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Seat ids held by pending or confirmed bookings of a showtime.
    pub async fn held_seat_ids(pool: &SqlitePool, showtime_id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT json_extract(seat.value, '$.id')
             FROM bookings b, json_each(b.seats) AS seat
             WHERE b.showtime_id = ? AND b.status != 'cancelled'",
        )
        .bind(showtime_id)
        .fetch_all(pool)
        .await
    }

    pub async fn totals(pool: &SqlitePool) -> Result<BookingTotals, sqlx::Error> {
        sqlx::query_as::<_, BookingTotals>(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(status = 'confirmed'), 0) AS confirmed,
                    COALESCE(SUM(status = 'pending'), 0) AS pending,
                    COALESCE(SUM(status = 'cancelled'), 0) AS cancelled,
                    COALESCE(SUM(CASE WHEN status = 'confirmed' THEN total_price END), 0.0) AS revenue
             FROM bookings",
        )
        .fetch_one(pool)
        .await
    }

    pub fn seat_ids(&self) -> impl Iterator<Item = &str> {
        self.seats.0.iter().map(|s| s.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::seat::SeatType;
    use crate::models::user::{NewUser, Role, User};

    fn seat(id: &str) -> Seat {
        Seat {
            id: id.to_string(),
            row: id[..1].to_string(),
            number: id[1..].parse().unwrap(),
            seat_type: SeatType::Standard,
            price: 250,
        }
    }

    async fn user(pool: &SqlitePool) -> i64 {
        User::create(
            pool,
            NewUser {
                email: "b@example.com",
                password_hash: "h",
                first_name: None,
                last_name: None,
                phone: None,
                role: Role::User,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_booking(user_id: i64, code: &str, seats: &[&str], status: BookingStatus) -> NewBooking {
        NewBooking {
            user_id,
            movie_id: "550".into(),
            showtime_id: "550-room-1-2024-05-01-0".into(),
            room_id: "room-1".into(),
            seats: seats.iter().map(|s| seat(s)).collect(),
            total_price: 250.0 * seats.len() as f64,
            status,
            payment_method: Some(PaymentMethod::Gcash),
            booking_code: code.into(),
        }
    }

    #[tokio::test]
    async fn insert_round_trips_seats_and_enums() {
        let db = Database::in_memory().await.unwrap();
        let uid = user(&db.pool).await;
        let booking = Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00001", &["A1", "A2"], BookingStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(booking.seat_ids().collect::<Vec<_>>(), vec!["A1", "A2"]);
        assert_eq!(booking.payment_method, Some(PaymentMethod::Gcash));

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["id"], serde_json::json!(booking.id.to_string()));
        assert_eq!(json["paymentMethod"], "gcash");
        assert_eq!(json["seats"][1]["id"], "A2");
        assert!(Booking::code_exists(&db.pool, "CMX-2024-00001").await.unwrap());
    }

    #[tokio::test]
    async fn held_seats_skip_cancelled_bookings() {
        let db = Database::in_memory().await.unwrap();
        let uid = user(&db.pool).await;
        Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00001", &["A1"], BookingStatus::Confirmed)).await.unwrap();
        Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00002", &["B2"], BookingStatus::Cancelled)).await.unwrap();
        Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00003", &["C3"], BookingStatus::Pending)).await.unwrap();

        let mut held = Booking::held_seat_ids(&db.pool, "550-room-1-2024-05-01-0").await.unwrap();
        held.sort();
        assert_eq!(held, vec!["A1", "C3"]);
        assert!(Booking::held_seat_ids(&db.pool, "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn totals_count_statuses_and_confirmed_revenue() {
        let db = Database::in_memory().await.unwrap();
        let uid = user(&db.pool).await;
        Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00001", &["A1", "A2"], BookingStatus::Confirmed)).await.unwrap();
        Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00002", &["B2"], BookingStatus::Cancelled)).await.unwrap();

        let totals = Booking::totals(&db.pool).await.unwrap();
        assert_eq!((totals.total, totals.confirmed, totals.pending, totals.cancelled), (2, 1, 0, 1));
        assert_eq!(totals.revenue, 500.0);
    }

    #[tokio::test]
    async fn status_updates_and_deletes() {
        let db = Database::in_memory().await.unwrap();
        let uid = user(&db.pool).await;
        let b = Booking::insert(&db.pool, &new_booking(uid, "CMX-2024-00001", &["A1"], BookingStatus::Pending)).await.unwrap();
        let updated = Booking::set_status(&db.pool, b.id, BookingStatus::Confirmed).await.unwrap().unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert!(Booking::set_status(&db.pool, 404, BookingStatus::Confirmed).await.unwrap().is_none());
        assert!(Booking::delete(&db.pool, b.id).await.unwrap());
        assert!(Booking::find_by_id(&db.pool, b.id).await.unwrap().is_none());
    }
}
