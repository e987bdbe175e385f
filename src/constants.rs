// Theater identifiers used in configuration and on the CLI

pub const CINEMAXX: &str = "cinemaxx";
pub const CAPITOL: &str = "capitol";
pub const TRAUMPALAST: &str = "traumpalast";
pub const LOKAHFILMS: &str = "lokahfilms";

pub const CINEMAXX_NAME: &str = "CinemaxX Stuttgart";
pub const CAPITOL_NAME: &str = "Capitol Lichtspiele Kornwestheim";
pub const TRAUMPALAST_NAME: &str = "Traumpalast Leonberg";
pub const LOKAHFILMS_NAME: &str = "Lokah Films Events";

/// Several theater sites reject default client identities.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";

/// Showtime text for full-text matches, which cannot localize a time string.
pub const FULL_TEXT_TIMES_PLACEHOLDER: &str = "Check source site for exact times";

pub const DEFAULT_MAX_PAGES: u32 = 5;
pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NEXT_PAGE_SELECTOR: &str = "a.next";

pub const MOVIE_TITLE_SELECTOR: &str = "div.movie-title";
pub const SHOWTIME_SELECTOR: &str = "div.showtime";

/// Placeholder substituted with the page number in pagination templates.
pub const PAGE_PLACEHOLDER: &str = "{page}";
pub const BARE_PLACEHOLDER: &str = "{}";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "SHOWTIME_CONFIG";

/// Get all built-in theater ids in priority order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![CINEMAXX, CAPITOL, TRAUMPALAST, LOKAHFILMS]
}
