//! Native Currency Adapters

pub mod memory;

pub use memory::InMemoryCurrency;
