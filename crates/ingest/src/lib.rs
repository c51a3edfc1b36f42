pub mod commit;
pub mod http;
pub mod otlp;
pub mod server;
pub mod session;
pub mod spans;
