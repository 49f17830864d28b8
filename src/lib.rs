pub mod availability;
pub mod books;
pub mod core;
pub mod gateway;
pub mod loans;
pub mod reservations;
pub mod users;
pub mod utils;
