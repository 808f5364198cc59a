// src/aggregate/sources/mod.rs
pub mod esports;
pub mod scraper;
pub mod ticketing;

pub use esports::EsportsSource;
pub use scraper::ScraperSource;
pub use ticketing::{TicketingCredentials, TicketingSource};
