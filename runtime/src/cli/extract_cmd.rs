//! `orgscope extract <file>`: run extraction on saved page markup.

use super::output;
use crate::extraction::extract_with_source;
use crate::persist;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run the extract command.
pub async fn run(file: &Path, output_file: Option<&Path>) -> Result<()> {
    let markup = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let (record, source) = extract_with_source(&markup);
    info!(
        fields = record.filled_fields(),
        "extracted {} from {source}",
        file.display()
    );

    if let Some(path) = output_file {
        persist::save_json(&record, path)?;
        output::note(&format!("Saved to {}", path.display()));
        return Ok(());
    }

    if output::is_json() {
        output::print_json(&serde_json::to_value(&record)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_file_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("acme.html");
        let out = dir.path().join("acme.json");
        std::fs::write(
            &page,
            r#"<script id="ng-state" type="application/json">{"contact_email":"hi@acme.test"}</script>"#,
        )
        .unwrap();

        run(&page, Some(&out)).await.unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved["email"], "hi@acme.test");
        assert!(saved["website_url"].is_null());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("nope.html"), None).await.is_err());
    }
}
