//! Last-updated timestamp of the status dataset.

use crate::constants::LAST_UPDATED_UNAVAILABLE;
use crate::Result;
use log::{debug, warn};
use reqwest::header::LAST_MODIFIED;

/// Sends a HEAD request and returns the `Last-Modified` header, if any
pub async fn fetch_last_updated(client: &reqwest::Client, url: &str) -> Result<Option<String>> {
    debug!("Requesting last-modified date of {}", url);
    let response = client.head(url).send().await?.error_for_status()?;
    let modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Ok(modified)
}

/// Text for the status line; any failure becomes the fixed fallback, no retry
pub fn last_updated_text(fetched: &Result<Option<String>>) -> String {
    match fetched {
        Ok(Some(date)) => format!("Statuses last updated: {}", date),
        Ok(None) => {
            warn!("Status dataset has no Last-Modified header");
            LAST_UPDATED_UNAVAILABLE.to_string()
        }
        Err(e) => {
            warn!("Failed to fetch last updated timestamp: {}", e);
            LAST_UPDATED_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_last_updated_text() {
        let fetched = Ok(Some("Tue, 03 Sep 2024 14:00:00 GMT".to_string()));
        assert_eq!(
            last_updated_text(&fetched),
            "Statuses last updated: Tue, 03 Sep 2024 14:00:00 GMT"
        );
    }

    #[test]
    fn test_missing_header_and_errors_fall_back() {
        assert_eq!(last_updated_text(&Ok(None)), LAST_UPDATED_UNAVAILABLE);
        let failed: Result<Option<String>> = Err(Error::Config("offline".to_string()));
        assert_eq!(last_updated_text(&failed), LAST_UPDATED_UNAVAILABLE);
    }
}
