mod client;

pub use client::{write_atomic, Downloader};
