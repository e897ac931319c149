//! Per-share measures

pub mod eps;

pub use eps::EpsProxy;
