pub mod clipboard;
pub mod message;
pub mod ws;
