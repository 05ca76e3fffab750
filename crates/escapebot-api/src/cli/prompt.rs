//! `escapebot prompt set|show`

use std::path::Path;

use escapebot_core::repository::SessionStore;
use escapebot_infra::sqlite::session::SqliteSessionStore;
use escapebot_types::phase::Phase;

pub async fn set_prompt(store: &SqliteSessionStore, phase: Phase, file: &Path) -> anyhow::Result<()> {
    let prompt = tokio::fs::read_to_string(file).await?;
    if prompt.trim().is_empty() {
        anyhow::bail!("{} is empty", file.display());
    }

    store.set_prompt(phase, &prompt).await?;

    println!(
        "  {} Prompt for {} stored ({} chars)",
        console::style("✓").green(),
        console::style(phase).cyan(),
        prompt.chars().count()
    );
    Ok(())
}

pub async fn show_prompt(store: &SqliteSessionStore, phase: Phase) -> anyhow::Result<()> {
    match store.get_prompt(phase).await? {
        Some(prompt) => {
            println!("{prompt}");
            Ok(())
        }
        None => anyhow::bail!("no prompt stored for phase '{phase}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_set_prompt_from_file() {
        let harness = TestHarness::new(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("outro.txt");
        tokio::fs::write(&file, "あなたは案内人です。").await.unwrap();

        set_prompt(harness.store(), Phase::Outro, &file).await.unwrap();

        assert_eq!(
            harness.store().get_prompt(Phase::Outro).await.unwrap().as_deref(),
            Some("あなたは案内人です。")
        );
    }

    #[tokio::test]
    async fn test_blank_file_is_refused() {
        let harness = TestHarness::new(&[]).await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blank.txt");
        tokio::fs::write(&file, "  \n").await.unwrap();

        assert!(set_prompt(harness.store(), Phase::Intro, &file).await.is_err());
        assert_eq!(
            harness.store().get_prompt(Phase::Intro).await.unwrap().as_deref(),
            Some("prompt:intro")
        );
    }
}
