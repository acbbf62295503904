//! Request routing: parameter extraction, store key layout and resolution.

pub mod extract;
pub mod keys;
pub mod resolve;

pub use extract::RoutedMethod;
pub use resolve::resolve;
