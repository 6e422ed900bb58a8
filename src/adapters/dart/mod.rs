pub mod client;
pub mod corp_code;

pub use client::{DartClient, DEFAULT_BASE_URL};
