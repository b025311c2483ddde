pub mod crn;
pub mod desired_state;
pub mod env;
pub mod envelope;
pub mod errors;
pub mod http;
pub mod metrics;
pub mod metrics_defs;
pub mod pager;
pub mod power_iaas;
pub mod regions;
