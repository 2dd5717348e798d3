//! Outbound HTTP for link checks.

pub mod probe;
pub mod reqwest_probe;

pub use probe::LinkProbe;
pub use reqwest_probe::{ProbeError, ProbeSettings, ReqwestProbe};

#[cfg(test)]
pub use probe::MockLinkProbe;
