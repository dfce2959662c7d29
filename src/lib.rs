#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod config;
pub mod export_data;
pub mod gps_processor;
pub mod heading;
pub mod logs;
pub mod route_exporter;
pub mod route_track;
pub mod session;
pub mod trip_aggregator;
pub mod utils;
