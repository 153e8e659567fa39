pub mod provider_manager;
pub mod provisioning;
pub mod settings;

pub use provisioning::{assemble_request, provision, render_metadata};
