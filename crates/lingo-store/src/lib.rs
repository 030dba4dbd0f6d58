mod client;

pub use client::HttpWordStore;
