//! Command implementations

pub mod test;
