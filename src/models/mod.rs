pub mod booking;
pub mod movie;
pub mod pricing;
pub mod room;
pub mod seat;
pub mod session;
pub mod showtime;
pub mod user;

pub use booking::Booking;
pub use movie::Movie;
pub use room::ViewingRoom;
pub use seat::Seat;
pub use user::User;
