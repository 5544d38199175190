//! # Game Implementations Module
//!
//! Board models the policies play on. Connect-N is the only game: a
//! gravity grid with configurable height, width and winning streak.
//!
//! ## Board Contract
//! The board provides:
//! - Legal move generation in ascending column order
//! - Move application with O(streak) win detection through the placed piece
//! - Terminal state classification (win, draw, ongoing)
//! - A canonical state key used for table lookups

pub mod connect4;
