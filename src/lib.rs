//! Core library for shelfio, a personal book tracker.
//!
//! The [`store`] module is the single source of truth; [`library`] and
//! [`stats`] derive views from it, [`openlibrary`] feeds it from search
//! results and [`remote`] imports books from a shelf REST service.

pub mod config;
pub mod library;
pub mod logging;
pub mod openlibrary;
pub mod remote;
pub mod stats;
pub mod store;

pub use config::Config;
pub use store::Store;
