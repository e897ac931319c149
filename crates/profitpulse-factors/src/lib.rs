#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod error;
pub mod margin;
pub mod per_share;
pub mod proxy;
pub mod registry;
pub mod returns;

pub use builder::{ProxyBuilder, ProxyConfig};
pub use error::ProxyError;
pub use proxy::{Proxy, ProxyKind, ProxyRecord, ProxySet};

// Re-export registry types for convenience
pub use registry::{
    ProxyCategory, ProxyInfo, available_proxies, get_proxy_info, list_proxy_names,
    proxies_by_category,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
