pub mod states;
pub mod store;
pub mod boundary;
pub mod domain;
pub mod index;
pub mod transport;
pub mod barnes_hut;
pub mod registry;
pub mod engine;
pub mod scenario;
