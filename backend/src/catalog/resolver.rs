//! Rack-space resolution with neighbour fallback.
//!
//! Only five-digit style numbers may borrow a rack from a nearby style: the
//! probe walks `+1..=+100` first, then `-1..=-100`, and the first style with a
//! usable rack wins, regardless of which one is numerically closer.

use crate::catalog::CatalogSnapshot;
use common::model::catalog::{CatalogRecord, RackResolution};
use log::warn;

/// Largest offset probed in each direction.
pub const PROBE_RANGE: u32 = 100;

const FALLBACK_DIGITS: usize = 5;
const PLACEHOLDER_RACK: &str = "DEFAULT";

/// Strips quote characters, trims and uppercases a raw catalog rack value.
pub fn clean_rack_space(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect::<String>()
        .trim()
        .to_uppercase()
}

/// Cleaned rack value, or `None` when it is blank or the `DEFAULT` placeholder.
pub fn valid_rack_space(raw: &str) -> Option<String> {
    let cleaned = clean_rack_space(raw);
    (!cleaned.is_empty() && cleaned != PLACEHOLDER_RACK).then_some(cleaned)
}

fn digit_count(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}

fn valid_rack_at(catalog: &CatalogSnapshot, style: u32) -> Option<RackResolution> {
    let record = catalog.get(style)?;
    valid_rack_space(&record.rack_space).map(|rack_space| RackResolution {
        rack_space,
        resolved_style_number: style,
    })
}

fn probe_neighbours(catalog: &CatalogSnapshot, style: u32) -> Option<RackResolution> {
    let above = (1..=PROBE_RANGE).filter_map(|offset| style.checked_add(offset));
    let below = (1..=PROBE_RANGE).filter_map(|offset| style.checked_sub(offset));
    above
        .chain(below)
        .find_map(|candidate| valid_rack_at(catalog, candidate))
}

/// Resolves the rack to print for `style_number`.
///
/// Returns `None` when the style is not in the catalog, when a five-digit
/// style finds no usable rack within the probe window, or when any other
/// style has no usable rack of its own.
pub fn resolve_rack_space(style_number: u32, catalog: &CatalogSnapshot) -> Option<RackResolution> {
    let current = catalog.get(style_number)?;

    if let Some(rack_space) = valid_rack_space(&current.rack_space) {
        return Some(RackResolution {
            rack_space,
            resolved_style_number: style_number,
        });
    }

    if digit_count(style_number) != FALLBACK_DIGITS {
        return None;
    }

    let found = probe_neighbours(catalog, style_number);
    if found.is_none() {
        warn!(
            "No valid rack space found within +/-{} of style {}",
            PROBE_RANGE, style_number
        );
    }
    found
}

/// Convenience wrapper for callers holding a plain record list.
pub fn resolve_in_records(style_number: u32, records: &[CatalogRecord]) -> Option<RackResolution> {
    let snapshot = CatalogSnapshot::new(records.to_vec());
    resolve_rack_space(style_number, &snapshot)
}
