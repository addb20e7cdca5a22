mod poisson;
pub mod spawn_rate;
mod temporal_profile;

pub use poisson::sample_spawn_count;
pub use temporal_profile::TemporalProfile;
