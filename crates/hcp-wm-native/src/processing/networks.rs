//! Network-level summary of a region vector
//!
//! Groups regions by (network, hemisphere) and reports the mean and mean
//! absolute value per group.

use std::collections::BTreeMap;

use hcp_wm_core::types::{Hemisphere, Region};
use serde::{Deserialize, Serialize};

/// Summary of one (network, hemisphere) group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    /// Network name
    pub network: String,
    /// Hemisphere
    pub hemisphere: Hemisphere,
    /// Mean value over the group's regions
    pub mean: f64,
    /// Mean absolute value
    pub mean_abs: f64,
    /// Number of regions in the group
    pub n_regions: usize,
}

/// Group a region-length vector by network and hemisphere
///
/// Entries are ordered by network name, right hemisphere first. Regions
/// past the end of `values` are ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_networks(regions: &[Region], values: &[f64]) -> Vec<NetworkEntry> {
    let mut groups: BTreeMap<(&str, Hemisphere), (f64, f64, usize)> = BTreeMap::new();
    for (region, &value) in regions.iter().zip(values) {
        let slot = groups
            .entry((region.network.as_str(), region.hemisphere))
            .or_insert((0.0, 0.0, 0));
        slot.0 += value;
        slot.1 += value.abs();
        slot.2 += 1;
    }

    groups
        .into_iter()
        .map(|((network, hemisphere), (sum, sum_abs, n))| NetworkEntry {
            network: network.to_string(),
            hemisphere,
            mean: sum / n as f64,
            mean_abs: sum_abs / n as f64,
            n_regions: n,
        })
        .collect()
}
