//! Conversions between structured config values and their wire forms

use crate::error::{ClientError, Result};
use std::{fmt::Display, net::Ipv4Addr};

/// Join four octets with dots.
///
/// Performs no validation: out-of-range values are written as given and
/// left for the validator to reject.
pub fn encode_ipv4<T: Display>(octets: &[T; 4]) -> String {
    octets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted IPv4 wire string into its octets
pub fn decode_ipv4(text: &str) -> Result<[u8; 4]> {
    text.trim()
        .parse::<Ipv4Addr>()
        .map(|addr| addr.octets())
        .map_err(|e| ClientError::Decode(format!("invalid IPv4 address '{text}': {e}")))
}

/// Parse a comma-separated list of slave IDs and inclusive `start-end` ranges.
///
/// Lenient: tokens that are not IDs are skipped, a range with `start > end`
/// yields nothing, and duplicates are dropped after their first occurrence.
pub fn decode_slave_list(text: &str) -> Vec<u8> {
    let mut ids = Vec::new();
    let mut push = |id: u8| {
        if !ids.contains(&id) {
            ids.push(id);
        }
    };

    for token in text.trim().split(',') {
        match token.split_once('-') {
            Some((start, end)) => {
                if let (Ok(start), Ok(end)) = (start.trim().parse::<u8>(), end.trim().parse::<u8>())
                {
                    (start..=end).for_each(&mut push);
                }
            }
            None => {
                if let Ok(id) = token.trim().parse::<u8>() {
                    push(id);
                }
            }
        }
    }

    ids
}

/// Render a slave list the way the status page shows it, e.g. `1,2,5`
pub fn format_slave_list<T: Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
