//! Test helpers shared by unit tests, integration tests and downstream crates (behind the `test_utils` feature).
#[cfg(feature = "sqlite")]
pub mod prepare_env;
mod stub_gateway;

pub use stub_gateway::StubGateway;
