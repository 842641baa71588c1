//! Key layout shared with every reader and writer of the backend.
//!
//! ```text
//! stations          SET    station names
//! urls:<station>    SET    URLs monitored under <station>
//! status:<url>      STRING latest status string for <url>
//! ```

/// Set holding every station name
pub const STATIONS: &str = "stations";

const URLS_PREFIX: &str = "urls:";
const STATUS_PREFIX: &str = "status:";

/// Set of URLs belonging to `station`
pub fn urls(station: &str) -> String {
    format!("{URLS_PREFIX}{station}")
}

/// Scalar holding the status of `url`
pub fn status(url: &str) -> String {
    format!("{STATUS_PREFIX}{url}")
}
