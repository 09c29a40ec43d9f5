//! Background jobs

pub mod overdue;

pub use overdue::OverdueSweep;
