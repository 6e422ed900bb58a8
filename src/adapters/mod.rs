// Adapters layer: concrete implementations for external systems (OPENDART http, local storage).

pub mod dart;
pub mod storage;
