//! cosign image signer
//!
//! Signs a previously built container image once per cosign secret mounted
//! under a secrets directory, delegating the actual signing to cosign.

pub mod config;
pub mod cosign;
pub mod error;
pub mod output;
pub mod report;
pub mod secrets;
pub mod security;
