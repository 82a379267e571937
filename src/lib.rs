pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod gerrit;
pub mod policy;
pub mod presence;
pub mod report;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use policy::ExclusionPolicy;
