//! Durable identity seed storage.

#[cfg(test)]
mod test;

pub mod io_utils;
mod seed_store;

pub use seed_store::FileIdentitySeedStore;
