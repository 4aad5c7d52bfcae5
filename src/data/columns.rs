//! Column names of the PennDOT crash extracts.
//!
//! Files are read with a fixed whitelist; every count column is cast to
//! `Int64` and both coordinate columns to `Float64`, so tables loaded from
//! different files always stack.

/// Crash record number.
pub const CRN: &str = "CRN";
pub const INJURY_COUNT: &str = "INJURY_COUNT";
pub const FATAL_COUNT: &str = "FATAL_COUNT";
pub const MCYCLE_DEATH_COUNT: &str = "MCYCLE_DEATH_COUNT";
pub const BICYCLE_DEATH_COUNT: &str = "BICYCLE_DEATH_COUNT";
pub const PED_DEATH_COUNT: &str = "PED_DEATH_COUNT";
pub const CRASH_MONTH: &str = "CRASH_MONTH";
pub const CRASH_YEAR: &str = "CRASH_YEAR";
/// Latitude in decimal degrees (WGS84).
pub const DEC_LAT: &str = "DEC_LAT";
/// Longitude in decimal degrees (WGS84).
pub const DEC_LONG: &str = "DEC_LONG";

/// Integer columns, in output order.
pub const COUNT_COLUMNS: [&str; 8] = [
    CRN,
    INJURY_COUNT,
    FATAL_COUNT,
    MCYCLE_DEATH_COUNT,
    BICYCLE_DEATH_COUNT,
    PED_DEATH_COUNT,
    CRASH_MONTH,
    CRASH_YEAR,
];

/// Coordinate columns, in output order (after the counts).
pub const COORDINATE_COLUMNS: [&str; 2] = [DEC_LAT, DEC_LONG];

/// Every column a crash file must provide.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    CRN,
    INJURY_COUNT,
    FATAL_COUNT,
    MCYCLE_DEATH_COUNT,
    BICYCLE_DEATH_COUNT,
    PED_DEATH_COUNT,
    CRASH_MONTH,
    CRASH_YEAR,
    DEC_LAT,
    DEC_LONG,
];
