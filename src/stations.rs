//! Station code to display name lookup.
//!
//! NS identifies stations by short codes (`ESK`, `HGL`), while the departures
//! API reports destinations by full name. Destination filters may be written
//! with either, so both the header label and the filter go through this table.

use std::collections::HashSet;

const STATIONS: &[(&str, &str)] = &[
    ("AH", "Arnhem Centraal"),
    ("AMF", "Amersfoort Centraal"),
    ("AML", "Almelo"),
    ("APD", "Apeldoorn"),
    ("ASD", "Amsterdam Centraal"),
    ("ASS", "Amsterdam Sloterdijk"),
    ("BN", "Borne"),
    ("DV", "Deventer"),
    ("EHV", "Eindhoven Centraal"),
    ("ES", "Enschede"),
    ("ESD", "Enschede Drienerlo"),
    ("ESK", "Enschede Kennispark"),
    ("GN", "Groningen"),
    ("GVC", "Den Haag Centraal"),
    ("HGL", "Hengelo"),
    ("HGLO", "Hengelo Oost"),
    ("HLM", "Haarlem"),
    ("LW", "Leeuwarden"),
    ("NM", "Nijmegen"),
    ("OLDZ", "Oldenzaal"),
    ("RTD", "Rotterdam Centraal"),
    ("SHL", "Schiphol Airport"),
    ("UT", "Utrecht Centraal"),
    ("ZL", "Zwolle"),
    ("ZP", "Zutphen"),
];

/// Full display name for a station code, if the code is known.
pub fn station_name(code: &str) -> Option<&'static str> {
    STATIONS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Header label for a station: the full name, or the code itself when unknown.
pub fn full_station_name(code: &str) -> String {
    station_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_uppercase())
}

/// Normalize configured destination exclusions for case-insensitive matching.
///
/// Station codes are expanded to their full name; anything else is taken as a
/// destination name. Every entry is lowercased.
pub fn resolve_filter<I, S>(entries: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref().trim();
            station_name(entry).unwrap_or(entry).to_lowercase()
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}
