//! Common types used throughout the Cadiz framework.
//!
//! The [`Universe`] type carries the one invariant every other component
//! relies on: assets are de-duplicated and sorted lexicographically, and the
//! same ordering indexes the covariance matrix, the alpha vector, constraint
//! coefficients, and the optimized weights.

use crate::{CadizError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An asset identifier within the factor risk model.
///
/// Identifiers are opaque; resolving root versus child identifiers across
/// corporate actions happens in the data layer before they reach Cadiz.
pub type AssetId = String;

/// A canonical, ordered set of assets.
///
/// # Example
///
/// ```
/// use cadiz_traits::Universe;
///
/// let universe = Universe::new(["MSFT", "AAPL", "MSFT"]).unwrap();
/// assert_eq!(universe.assets(), &["AAPL".to_string(), "MSFT".to_string()]);
/// assert_eq!(universe.position("MSFT"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    assets: Vec<AssetId>,
}

impl Universe {
    /// Creates a universe, sorting and de-duplicating the given identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::EmptyUniverse`] if no assets are given.
    pub fn new<I, S>(assets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<AssetId>,
    {
        let mut assets: Vec<AssetId> = assets.into_iter().map(Into::into).collect();
        assets.sort_unstable();
        assets.dedup();

        if assets.is_empty() {
            return Err(CadizError::EmptyUniverse);
        }

        Ok(Self { assets })
    }

    /// Assets in canonical order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Always false; an empty universe cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Index of an asset in canonical order.
    pub fn position(&self, asset: &str) -> Option<usize> {
        self.assets
            .binary_search_by(|probe| probe.as_str().cmp(asset))
            .ok()
    }

    /// Whether the universe contains the asset.
    pub fn contains(&self, asset: &str) -> bool {
        self.position(asset).is_some()
    }

    /// Map from asset to canonical index.
    pub fn index_map(&self) -> HashMap<&str, usize> {
        self.assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.as_str(), i))
            .collect()
    }

    /// Iterate over the assets in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, AssetId> {
        self.assets.iter()
    }

    /// Check that `other` is the same universe, reporting the first difference.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::Misaligned`] naming `context` if the asset lists differ.
    pub fn ensure_same(&self, other: &Self, context: &str) -> Result<()> {
        if self == other {
            return Ok(());
        }

        let missing: Vec<&str> = self
            .iter()
            .filter(|a| !other.contains(a))
            .map(String::as_str)
            .take(5)
            .collect();
        let extra: Vec<&str> = other
            .iter()
            .filter(|a| !self.contains(a))
            .map(String::as_str)
            .take(5)
            .collect();

        Err(CadizError::misaligned(
            context,
            format!(
                "expected {} assets, found {} (missing {:?}, unexpected {:?})",
                self.len(),
                other.len(),
                missing,
                extra
            ),
        ))
    }
}

impl<'a> IntoIterator for &'a Universe {
    type Item = &'a AssetId;
    type IntoIter = std::slice::Iter<'a, AssetId>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
