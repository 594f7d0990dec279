//! Stock Relay Change Listener — turns database notifications into a typed,
//! cancellable stream of stock change events.

pub mod pg_change_source;
pub mod stock_listener;

pub use pg_change_source::{PgChangeSource, PgConnectionSettings};
pub use stock_listener::StockListener;
