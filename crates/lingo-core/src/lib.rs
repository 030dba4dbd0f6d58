pub mod board;
pub mod capture;
pub mod clock;
pub mod error;
pub mod language;
pub mod notes;
pub mod notify;
pub mod preprocess;
pub mod review;
pub mod store;
