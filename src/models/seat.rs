use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::room::{RoomType, ViewingRoom};

/// Price difference between a room's regular seats and its better or lesser ones.
pub const SEAT_TIER_STEP: i64 = 50;

const ROW_LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatType {
    Standard,
    Premium,
    Vip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Occupied,
}

/// A seat as stored on a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub row: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub seat_type: SeatType,
    pub price: i64,
}

/// A seat in a showtime's map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSeat {
    #[serde(flatten)]
    pub seat: Seat,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatRow {
    pub row: String,
    pub seats: Vec<MapSeat>,
}

pub fn row_label(row_index: u32) -> String {
    ROW_LABELS
        .get(row_index as usize)
        .map(|b| (*b as char).to_string())
        .unwrap_or_else(|| format!("R{}", row_index + 1))
}

/// Type and price of one seat. `row_index` is zero-based, `number` starts at 1.
pub fn seat_pricing(room_type: RoomType, room_price: i64, row_index: u32, number: u32) -> (SeatType, i64) {
    match room_type {
        RoomType::Vip => (SeatType::Vip, room_price),
        RoomType::Premium if row_index < 2 => (SeatType::Premium, room_price),
        RoomType::Premium => (SeatType::Standard, room_price - SEAT_TIER_STEP),
        RoomType::ThreeD => (SeatType::Standard, room_price),
        RoomType::Basic if (3..=5).contains(&row_index) && (4..=9).contains(&number) => {
            (SeatType::Premium, room_price + SEAT_TIER_STEP)
        }
        RoomType::Basic => (SeatType::Standard, room_price),
    }
}

/// Builds the full seat grid of a room for one showtime.
pub fn generate_seat_map(room: &ViewingRoom, room_price: i64, occupied: &HashSet<String>) -> Vec<SeatRow> {
    (0..room.rows)
        .map(|row_index| {
            let row = row_label(row_index);
            let seats = (1..=room.seats_per_row)
                .map(|number| {
                    let (seat_type, price) = seat_pricing(room.room_type, room_price, row_index, number);
                    let id = format!("{row}{number}");
                    let status = if occupied.contains(&id) {
                        SeatStatus::Occupied
                    } else {
                        SeatStatus::Available
                    };
                    MapSeat {
                        seat: Seat { id, row: row.clone(), number, seat_type, price },
                        status,
                    }
                })
                .collect();
            SeatRow { row, seats }
        })
        .collect()
}

/// Resolves a seat id such as `"D7"` against a room's grid. Only the
/// canonical spelling matches: `"D07"` is not a seat.
pub fn lookup_seat(room: &ViewingRoom, room_price: i64, seat_id: &str) -> Option<Seat> {
    let split = seat_id.find(|c: char| c.is_ascii_digit())?;
    let (label, digits) = seat_id.split_at(split);
    let row_index = (0..room.rows).find(|i| row_label(*i) == label)?;
    let number: u32 = digits.parse().ok()?;
    if number == 0 || number > room.seats_per_row || number.to_string() != digits {
        return None;
    }
    let (seat_type, price) = seat_pricing(room.room_type, room_price, row_index, number);
    Some(Seat {
        id: seat_id.to_string(),
        row: label.to_string(),
        number,
        seat_type,
        price,
    })
}
