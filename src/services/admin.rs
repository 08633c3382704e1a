use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{
        booking::Booking,
        user::{Role, User},
    },
    services::catalog::MovieCatalog,
};

pub const REVENUE_CURRENCY: &str = "PHP";

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub admins: i64,
    pub regular: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingStats {
    pub total: i64,
    pub confirmed: i64,
    pub pending: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueStats {
    pub total: f64,
    pub currency: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieStats {
    pub total: usize,
    pub now_showing: usize,
    pub coming_soon: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub bookings: BookingStats,
    pub revenue: RevenueStats,
    pub movies: MovieStats,
}

pub async fn dashboard(pool: &SqlitePool, catalog: &MovieCatalog) -> AppResult<DashboardStats> {
    let total_users = User::count(pool, None).await?;
    let admins = User::count(pool, Some(Role::Admin)).await?;
    let totals = Booking::totals(pool).await?;
    let movies = catalog.all().await;

    Ok(DashboardStats {
        users: UserStats { total: total_users, admins, regular: total_users - admins },
        bookings: BookingStats {
            total: totals.total,
            confirmed: totals.confirmed,
            pending: totals.pending,
            cancelled: totals.cancelled,
        },
        revenue: RevenueStats { total: totals.revenue, currency: REVENUE_CURRENCY },
        movies: MovieStats {
            total: movies.len(),
            now_showing: movies.iter().filter(|m| m.is_now_showing).count(),
            coming_soon: movies.iter().filter(|m| m.is_coming_soon).count(),
        },
    })
}
