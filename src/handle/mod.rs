//! Http handlers, one module per api area.

pub mod account;
pub mod gaam;
pub mod manage;
