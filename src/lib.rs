pub mod announce;
pub mod bot;
pub mod clock;
pub mod config;
pub mod environment;
pub mod errors;
pub mod fingerprint;
pub mod marker;
pub mod matching;
pub mod registry;
pub mod routes;
pub mod schedule;
pub mod store;
pub mod team;
pub mod timestamp;
