//! Port traits connecting the domain to its collaborators.

pub mod config_port;
pub mod modifier_port;
pub mod price_port;
pub mod resource_port;
