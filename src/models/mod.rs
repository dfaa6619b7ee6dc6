pub mod types;

pub use types::{round_cents, Fill, Order, OrderBook, TransactionRecord, Wallet};
