use crate::config::types::{
    CollectionEntry, Config, CrawlerConfig, DownloadConfig, HistoryConfig, MediaConfig,
    SourceConfig,
};
use crate::url::render_template;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_download_config(&config.download)?;
    validate_source_config(&config.source)?;
    validate_history_config(&config.history)?;
    validate_media_config(&config.media)?;
    validate_collections(&config.collections)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.item_workers < 1 || config.item_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "item_workers must be between 1 and 64, got {}",
            config.item_workers
        )));
    }

    Ok(())
}

/// Validates chunked transfer configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.chunk_size == 0 {
        return Err(ConfigError::Validation(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    if config.chunk_workers < 1 || config.chunk_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "chunk_workers must be between 1 and 64, got {}",
            config.chunk_workers
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the listing and item URL templates
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    for placeholder in ["{collection}", "{page}"] {
        if !config.listing_url.contains(placeholder) {
            return Err(ConfigError::InvalidTemplate(format!(
                "listing_url must contain {}",
                placeholder
            )));
        }
    }

    if !config.item_url.contains("{id}") {
        return Err(ConfigError::InvalidTemplate(
            "item_url must contain {id}".to_string(),
        ));
    }

    render_template(&config.listing_url, &[("collection", "1"), ("page", "1")])
        .map_err(|e| ConfigError::InvalidTemplate(format!("listing_url: {}", e)))?;
    render_template(&config.item_url, &[("id", "sample")])
        .map_err(|e| ConfigError::InvalidTemplate(format!("item_url: {}", e)))?;

    Ok(())
}

/// Validates history ledger configuration
fn validate_history_config(config: &HistoryConfig) -> Result<(), ConfigError> {
    if config.folder.is_empty() {
        return Err(ConfigError::Validation(
            "history folder cannot be empty".to_string(),
        ));
    }

    if config.separator.is_empty() || config.separator.contains('\n') {
        return Err(ConfigError::Validation(format!(
            "history separator must be non-empty and single-line, got {:?}",
            config.separator
        )));
    }

    Ok(())
}

/// Validates media naming configuration
fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    if config.ffmpeg.is_empty() {
        return Err(ConfigError::Validation(
            "ffmpeg cannot be empty".to_string(),
        ));
    }

    // The merged output is `<title><video-suffix>`; the prefix keeps the
    // intermediate video file from colliding with it.
    if config.prefix.is_empty() {
        return Err(ConfigError::Validation(
            "media prefix cannot be empty".to_string(),
        ));
    }

    if config.mark && config.mark_symbol.len() != 1 {
        return Err(ConfigError::Validation(format!(
            "mark_symbol must be exactly one byte, got {:?}",
            config.mark_symbol
        )));
    }

    Ok(())
}

/// Validates collection entries
fn validate_collections(collections: &[CollectionEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in collections {
        if entry.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "collection id cannot be empty".to_string(),
            ));
        }

        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "collection '{}' must have a name",
                entry.id
            )));
        }

        if !seen.insert(entry.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "collection '{}' is listed more than once",
                entry.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceConfig {
        SourceConfig {
            listing_url: "https://api.example.com/search?mid={collection}&pn={page}".to_string(),
            item_url: "https://www.example.com/video/{id}/".to_string(),
        }
    }

    #[test]
    fn test_validate_source_config() {
        assert!(validate_source_config(&source()).is_ok());

        let mut missing_page = source();
        missing_page.listing_url = "https://api.example.com/search?mid={collection}".to_string();
        assert!(validate_source_config(&missing_page).is_err());

        let mut missing_id = source();
        missing_id.item_url = "https://www.example.com/video/".to_string();
        assert!(validate_source_config(&missing_id).is_err());

        let mut not_a_url = source();
        not_a_url.item_url = "video/{id}".to_string();
        assert!(validate_source_config(&not_a_url).is_err());
    }

    #[test]
    fn test_validate_media_config() {
        assert!(validate_media_config(&MediaConfig::default()).is_ok());

        let mut no_prefix = MediaConfig::default();
        no_prefix.prefix = String::new();
        assert!(validate_media_config(&no_prefix).is_err());

        let mut long_symbol = MediaConfig::default();
        long_symbol.mark_symbol = "CC".to_string();
        assert!(validate_media_config(&long_symbol).is_err());

        long_symbol.mark = false;
        assert!(validate_media_config(&long_symbol).is_ok());
    }

    #[test]
    fn test_validate_collections() {
        let entry = |id: &str, name: &str| CollectionEntry {
            id: id.to_string(),
            name: name.to_string(),
        };

        assert!(validate_collections(&[entry("1", "a"), entry("2", "b")]).is_ok());
        assert!(validate_collections(&[entry("", "a")]).is_err());
        assert!(validate_collections(&[entry("1", " ")]).is_err());
        assert!(validate_collections(&[entry("1", "a"), entry("1", "b")]).is_err());
    }

    #[test]
    fn test_validate_history_config() {
        assert!(validate_history_config(&HistoryConfig::default()).is_ok());

        let mut bad = HistoryConfig::default();
        bad.separator = "\n".to_string();
        assert!(validate_history_config(&bad).is_err());
    }
}
