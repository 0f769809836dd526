pub mod handlers;
pub mod server;

pub use server::{cancel_on_shutdown_signal, init_tracing, router, run_exporter, serve};
