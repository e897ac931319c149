//! Margin measures

pub mod npm;

pub use npm::NpmProxy;
