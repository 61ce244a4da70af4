/// Unix epoch seconds, the unit weewx uses for `dateTime`.
pub type EpochSeconds = i64;
