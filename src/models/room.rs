use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "premium")]
    Premium,
    #[serde(rename = "vip")]
    Vip,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [RoomType::Basic, RoomType::ThreeD, RoomType::Premium, RoomType::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Basic => "basic",
            RoomType::ThreeD => "3d",
            RoomType::Premium => "premium",
            RoomType::Vip => "vip",
        }
    }

    /// Key of this tier's multiplier in `pricing_config`.
    pub fn multiplier_key(&self) -> String {
        format!("room_{}_multiplier", self.as_str())
    }

    pub fn default_multiplier(&self) -> f64 {
        match self {
            RoomType::Basic => 1.0,
            RoomType::ThreeD => 1.3,
            RoomType::Premium => 1.8,
            RoomType::Vip => 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingRoom {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: u32,
    pub rows: u32,
    pub seats_per_row: u32,
    pub amenities: &'static [&'static str],
    pub description: &'static str,
}

pub static VIEWING_ROOMS: [ViewingRoom; 4] = [
    ViewingRoom {
        id: "room-1",
        name: "Cinema Hall 1",
        room_type: RoomType::Basic,
        capacity: 120,
        rows: 10,
        seats_per_row: 12,
        amenities: &["Standard Screen", "Dolby Surround", "Air Conditioned"],
        description: "Our classic cinema experience with crystal-clear visuals and immersive sound.",
    },
    ViewingRoom {
        id: "room-2",
        name: "3D Experience",
        room_type: RoomType::ThreeD,
        capacity: 80,
        rows: 8,
        seats_per_row: 10,
        amenities: &["3D Glasses Included", "RealD 3D", "Dolby Atmos", "Reclining Seats"],
        description: "Step into the action with our state-of-the-art 3D technology and enhanced audio.",
    },
    ViewingRoom {
        id: "room-3",
        name: "ULTRAMAX Premium",
        room_type: RoomType::Premium,
        capacity: 60,
        rows: 6,
        seats_per_row: 10,
        amenities: &[
            "Giant Screen",
            "Dolby Atmos",
            "Laser Projection",
            "Premium Recliners",
            "Extra Legroom",
        ],
        description: "The ultimate viewing experience with our largest screen and premium comfort.",
    },
    ViewingRoom {
        id: "room-4",
        name: "VIP Lounge",
        room_type: RoomType::Vip,
        capacity: 24,
        rows: 4,
        seats_per_row: 6,
        amenities: &[
            "Private Lounge",
            "In-Seat Service",
            "Complimentary Snacks",
            "Blankets",
            "Butler Service",
            "Exclusive Bar Access",
        ],
        description: "Indulge in luxury with our exclusive VIP experience featuring personalized service.",
    },
];

pub fn find_room(id: &str) -> Option<&'static ViewingRoom> {
    VIEWING_ROOMS.iter().find(|r| r.id == id)
}

/// A room as served to clients, with its live multiplier and ticket price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListing {
    #[serde(flatten)]
    pub room: &'static ViewingRoom,
    pub price_multiplier: f64,
    pub price: i64,
}
