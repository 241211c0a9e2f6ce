//! Checkbox-driven bounded selection shared by every module.

pub mod set;

#[cfg(test)]
mod props;

pub use set::{Capacity, Selectable, SelectionSet, Toggle};
