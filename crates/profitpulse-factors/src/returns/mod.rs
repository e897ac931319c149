//! Return ratios - net income over a balance-sheet base
//!
//! Assets, equity and par-value capital each give a different view of how
//! much profit the firm extracts from what it holds.

pub mod roa;
pub mod roc;
pub mod roe;

pub use roa::RoaProxy;
pub use roc::RocProxy;
pub use roe::RoeProxy;
