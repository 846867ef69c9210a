//! Types library for the commodity exchange
//!
//! This library provides all core type definitions used across the exchange
//! system, ensuring type safety and deterministic settlement arithmetic.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, OwnerId, LocationId, ItemId, CurrencyCode, BookId)
//! - `numeric`: Fixed-point types (Price, Quantity)
//! - `order`: Order lifecycle types
//! - `trade`: Settled trade records
//! - `errors`: Error taxonomy

// Public modules
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
}
