use chrono::NaiveDate;
use serde::Serialize;

/// Daily start times, in slot order.
pub const SLOT_TIMES: [&str; 5] = ["10:00", "13:00", "16:00", "19:00", "22:00"];

/// Every slot is blocked out for this long regardless of the film's runtime.
pub const SLOT_LENGTH_MINUTES: u32 = 150;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    pub id: String,
    pub movie_id: String,
    pub room_id: String,
    pub start_time: String,
    pub end_time: String,
    pub date: String,
    pub price: i64,
    pub available_seats: u32,
}

/// `HH:MM` plus a duration, wrapped past midnight.
pub fn end_time(start: &str, duration_minutes: u32) -> Option<String> {
    let (h, m) = start.split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let total = hours * 60 + minutes + duration_minutes;
    Some(format!("{:02}:{:02}", (total / 60) % 24, total % 60))
}

pub fn showtime_id(movie_id: &str, room_id: &str, date: NaiveDate, slot: usize) -> String {
    format!("{}-{}-{}-{}", movie_id, room_id, date.format("%Y-%m-%d"), slot)
}

/// Generates the day's showtimes for a movie in a room. `available_seats`
/// starts at full capacity; callers subtract seats already booked.
pub fn generate_showtimes(movie_id: &str, room_id: &str, capacity: u32, date: NaiveDate, price: i64) -> Vec<Showtime> {
    SLOT_TIMES
        .iter()
        .enumerate()
        .map(|(slot, start)| Showtime {
            id: showtime_id(movie_id, room_id, date, slot),
            movie_id: movie_id.to_string(),
            room_id: room_id.to_string(),
            start_time: start.to_string(),
            end_time: end_time(start, SLOT_LENGTH_MINUTES).unwrap_or_default(),
            date: date.format("%Y-%m-%d").to_string(),
            price,
            available_seats: capacity,
        })
        .collect()
}

/// Recovers `(date, slot)` from a showtime id, given the movie and room it must belong to.
pub fn parse_showtime_id(id: &str, movie_id: &str, room_id: &str) -> Option<(NaiveDate, usize)> {
    let prefix = format!("{movie_id}-{room_id}-");
    let rest = id.strip_prefix(&prefix)?;
    let (date, slot) = rest.rsplit_once('-')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let slot: usize = slot.parse().ok()?;
    (slot < SLOT_TIMES.len()).then_some((date, slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn five_slots_per_day() {
        let shows = generate_showtimes("550", "room-2", 80, day(), 325);
        assert_eq!(shows.len(), 5);
        assert_eq!(shows[0].id, "550-room-2-2024-05-01-0");
        assert_eq!(shows[0].end_time, "12:30");
        assert_eq!(shows[4].start_time, "22:00");
        assert_eq!(shows[4].end_time, "00:30");
        assert!(shows.iter().all(|s| s.price == 325 && s.available_seats == 80));
    }

    #[test]
    fn parse_round_trips_generated_ids() {
        for show in generate_showtimes("550", "room-1", 120, day(), 250) {
            let (date, slot) = parse_showtime_id(&show.id, "550", "room-1").unwrap();
            assert_eq!(date, day());
            assert_eq!(SLOT_TIMES[slot], show.start_time);
        }
    }

    #[test]
    fn parse_rejects_mismatches() {
        assert!(parse_showtime_id("550-room-1-2024-05-01-0", "551", "room-1").is_none());
        assert!(parse_showtime_id("550-room-1-2024-05-01-0", "550", "room-2").is_none());
        assert!(parse_showtime_id("550-room-1-2024-05-01-7", "550", "room-1").is_none());
        assert!(parse_showtime_id("550-room-1-2024-13-01-0", "550", "room-1").is_none());
    }

    #[test]
    fn end_time_rejects_garbage() {
        assert_eq!(end_time("25:00", 10), None);
        assert_eq!(end_time("noon", 10), None);
    }

    proptest! {
        #[test]
        fn end_time_stays_on_the_clock(h in 0u32..24, m in 0u32..60, d in 0u32..2000) {
            let out = end_time(&format!("{h:02}:{m:02}"), d).unwrap();
            let (eh, em) = out.split_once(':').unwrap();
            prop_assert!(eh.parse::<u32>().unwrap() < 24);
            prop_assert!(em.parse::<u32>().unwrap() < 60);
            prop_assert_eq!(((h * 60 + m + d) % 1440) / 60, eh.parse::<u32>().unwrap());
        }
    }
}
