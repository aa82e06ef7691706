pub mod room;
pub mod room_status;

pub use room_status::RoomStatus;
