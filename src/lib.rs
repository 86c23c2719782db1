//! Platform descriptor for the ECP5 Mini FPGA board.
//!
//! The board's pin tables are exposed through the `Platform` trait; the
//! Trellis backend turns them into a build plan and `dfu-util` flashes the
//! resulting bitstream.

pub mod blinky;
pub mod board;
pub mod config;
pub mod error;
pub mod platform;
pub mod products;
pub mod program;
pub mod resource;
pub mod trellis;

pub use board::Ecp5MiniPlatform;
pub use error::BoardError;
pub use platform::{Fragment, Platform};
