//! Mathbox CLI library: command dispatch, settings and the network and timer
//! plumbing around `mathbox_core`.

pub mod ai_client;
pub mod app;
pub mod chart;
pub mod config;
pub mod ticker;
