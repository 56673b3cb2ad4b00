//! Search module for Gomoku AI
//!
//! Fixed-depth alpha-beta minimax over radius-1 candidate cells with
//! one-ply static move ordering.

pub mod alphabeta;

pub use alphabeta::{SearchResult, SearchStats, Searcher, INF};
