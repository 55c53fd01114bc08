pub mod card;
pub mod client;
pub mod config;
pub mod discovery;
pub mod humanize;
pub mod ledger;
pub mod observability;
pub mod source;
pub mod storage;
