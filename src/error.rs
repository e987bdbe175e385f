use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Blank movie name; surfaced upstream as `no_movie_name`.
    #[error("Please enter a movie name")]
    EmptyQuery,
}

impl ScraperError {
    /// Stable machine-readable code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            ScraperError::Http(_) => "http_error",
            ScraperError::Toml(_) => "toml_error",
            ScraperError::Io(_) => "io_error",
            ScraperError::Config(_) => "config_error",
            ScraperError::Selector { .. } => "selector_error",
            ScraperError::EmptyQuery => "no_movie_name",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
