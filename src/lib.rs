//! Weighted grade aggregation for school records, with a JSON-lines sidecar
//! front end.

pub mod calc;
pub mod db;
pub mod gateway;
pub mod ipc;
pub mod logging;
pub mod term;
