//! Proxy Registry
//!
//! Static metadata for the five proxies. Allows lookup by name without
//! instantiating anything.

use crate::proxy::ProxyKind;
use profitpulse_data::RawField;
use std::collections::BTreeMap;

/// Proxy categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProxyCategory {
    /// Net income over a balance-sheet base (ROA, ROE, ROC)
    Returns,
    /// Per-share measures (EPS)
    PerShare,
    /// Income-statement margins (NPM)
    Margin,
}

/// Proxy metadata
#[derive(Debug, Clone)]
pub struct ProxyInfo {
    /// Proxy kind
    pub kind: ProxyKind,
    /// Display name (unique identifier)
    pub name: &'static str,
    /// Proxy category
    pub category: ProxyCategory,
    /// Brief description of what the proxy measures
    pub description: &'static str,
    /// Canonical input columns the proxy reads
    pub required_fields: &'static [RawField],
}

/// Get all available proxy info
pub fn available_proxies() -> Vec<ProxyInfo> {
    vec![
        ProxyInfo {
            kind: ProxyKind::Roa,
            name: "ROA",
            category: ProxyCategory::Returns,
            description: "Net income over total assets",
            required_fields: &[RawField::NetIncomePrimary, RawField::TotalAssets],
        },
        ProxyInfo {
            kind: ProxyKind::Roe,
            name: "ROE",
            category: ProxyCategory::Returns,
            description: "Net income over equity",
            required_fields: &[RawField::NetIncomePrimary, RawField::Equity],
        },
        ProxyInfo {
            kind: ProxyKind::Roc,
            name: "ROC",
            category: ProxyCategory::Returns,
            description: "Net income over shares issued times par value",
            required_fields: &[RawField::NetIncomePrimary, RawField::SharesIssued],
        },
        ProxyInfo {
            kind: ProxyKind::Eps,
            name: "EPS",
            category: ProxyCategory::PerShare,
            description: "Reported basic earnings per share",
            required_fields: &[RawField::Eps],
        },
        ProxyInfo {
            kind: ProxyKind::Npm,
            name: "NPM",
            category: ProxyCategory::Margin,
            description: "Net income over revenue",
            required_fields: &[RawField::NetIncomePrimary, RawField::Revenue],
        },
    ]
}

/// Get proxies by category
pub fn proxies_by_category(category: ProxyCategory) -> Vec<ProxyInfo> {
    available_proxies()
        .into_iter()
        .filter(|p| p.category == category)
        .collect()
}

/// Get proxy info by name (case-insensitive)
pub fn get_proxy_info(name: &str) -> Option<ProxyInfo> {
    available_proxies()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Get a map of all proxies indexed by name
pub fn proxy_map() -> BTreeMap<&'static str, ProxyInfo> {
    available_proxies()
        .into_iter()
        .map(|p| (p.name, p))
        .collect()
}

/// List all proxy names
pub fn list_proxy_names() -> Vec<&'static str> {
    available_proxies().into_iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_proxies_count() {
        assert_eq!(available_proxies().len(), 5);
    }

    #[test]
    fn test_registry_matches_kinds() {
        for (info, kind) in available_proxies().iter().zip(ProxyKind::ALL) {
            assert_eq!(info.kind, kind);
            assert_eq!(info.name, kind.name());
        }
    }

    #[test]
    fn test_proxies_by_category() {
        assert_eq!(proxies_by_category(ProxyCategory::Returns).len(), 3);
        assert_eq!(proxies_by_category(ProxyCategory::PerShare).len(), 1);
        assert_eq!(proxies_by_category(ProxyCategory::Margin).len(), 1);
    }

    #[test]
    fn test_get_proxy_info() {
        let roc = get_proxy_info("roc").unwrap();
        assert_eq!(roc.kind, ProxyKind::Roc);
        assert!(roc.required_fields.contains(&RawField::SharesIssued));

        assert!(get_proxy_info("ebitda").is_none());
    }

    #[test]
    fn test_list_proxy_names() {
        assert_eq!(list_proxy_names(), vec!["ROA", "ROE", "ROC", "EPS", "NPM"]);
        assert_eq!(proxy_map().len(), 5);
    }
}
