#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Raised by mock executors configured to fail.
    #[error("{message}")]
    Transport { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parse_conversion() {
        let e: Error = url::Url::parse("no scheme").unwrap_err().into();
        assert!(matches!(e, Error::UrlParse(_)));
        assert!(e.to_string().starts_with("URL parse error"));
    }

    #[test]
    fn transport_display_is_the_message() {
        let e = Error::Transport {
            message: "connection reset".to_string(),
        };
        assert_eq!(e.to_string(), "connection reset");
    }
}
