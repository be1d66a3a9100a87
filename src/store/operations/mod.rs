pub mod goals;
pub mod house_stats;
pub mod phases;
pub mod users;
