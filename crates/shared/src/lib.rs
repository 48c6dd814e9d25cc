//! Wire-level types shared by the board engine and anything that feeds it data.

pub mod domain;
pub mod error;
pub mod protocol;
