//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod config_validation;
pub mod error;
pub mod fetch;
pub mod indicator;
pub mod metrics;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod simulation;
