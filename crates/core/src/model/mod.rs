pub mod commit;
pub mod otel;
pub mod session;
pub mod span;
