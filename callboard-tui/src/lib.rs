//! Callboard terminal client library exports.

pub mod actions;
pub mod api_client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod importer;
pub mod keys;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod poller;
pub mod prompt;
pub mod roster;
pub mod state;
pub mod telemetry;
pub mod theme;
pub mod views;
pub mod widgets;
