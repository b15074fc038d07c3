use chrono::{TimeZone, Utc};
use infoia_core::{
    BlockStatus, Category, Digest, ItemId, NewsItem, SourceFailure, SummaryBlock, SummaryEntry,
};
use infoia_db::DigestRow;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["infoia"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_defaults() {
    let cli = Cli::try_parse_from(["infoia", "run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            sources: None,
            dry_run: false
        })
    ));
}

#[test]
fn parses_run_with_sources_and_dry_run() {
    let cli = Cli::try_parse_from([
        "infoia",
        "run",
        "--sources",
        "config/other.yaml",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            sources: Some(ref p),
            dry_run: true
        }) if p == std::path::Path::new("config/other.yaml")
    ));
}

#[test]
fn parses_sources_command() {
    let cli = Cli::try_parse_from(["infoia", "sources"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Sources { sources: None })));
}

#[test]
fn history_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["infoia", "history"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::History { limit: 10 })));

    let cli = Cli::try_parse_from(["infoia", "history", "--limit", "3"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::History { limit: 3 })));
}

#[test]
fn show_parses_date() {
    let cli = Cli::try_parse_from(["infoia", "show", "--date", "2026-03-02"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Show {
            date: Some(d),
            json: false
        }) if d == NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    ));
}

#[test]
fn show_rejects_malformed_date() {
    let result = Cli::try_parse_from(["infoia", "show", "--date", "02/03/2026"]);
    assert!(result.is_err());
}

#[test]
fn parses_stats_command() {
    let cli = Cli::try_parse_from(["infoia", "stats"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Stats)));
}

#[test]
fn prune_requires_days() {
    assert!(Cli::try_parse_from(["infoia", "prune"]).is_err());

    let cli = Cli::try_parse_from(["infoia", "prune", "--days", "30"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Prune { days: 30 })));
}

fn sample_digest() -> Digest {
    let generated_at = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
    let mut releases = SummaryBlock::empty(Category::Releases);
    releases.entries.push(SummaryEntry {
        item: NewsItem {
            id: ItemId::new("x"),
            title: "Model X released".to_string(),
            excerpt: "Our fastest model yet.".to_string(),
            url: "https://lab.example.com/model-x".to_string(),
            author: None,
            published_at: generated_at,
            source_id: "lab-blog".to_string(),
            source_name: "Lab Blog".to_string(),
            category: Category::Releases,
        },
        text: "Our fastest model yet.".to_string(),
        translated: false,
    });
    releases.status = BlockStatus::Degraded;
    Digest {
        run_id: uuid::Uuid::nil(),
        generated_at,
        edition: generated_at.date_naive(),
        blocks: vec![releases, SummaryBlock::empty(Category::Research)],
        source_failures: vec![SourceFailure {
            source_id: "flaky-news".to_string(),
            reason: "unexpected status 502".to_string(),
        }],
    }
}

#[test]
fn render_digest_marks_degraded_and_empty_blocks() {
    let text = digest::render_digest(&sample_digest());

    assert!(text.starts_with("Edición 2026-03-02\n"));
    assert!(text.contains("🚀 Lanzamientos de Modelos [sin traducir]"));
    assert!(text.contains("  - Model X released (Lab Blog)\n"));
    assert!(text.contains("📄 Research & Papers\n  (sin novedades)"));
    assert!(text.contains("! flaky-news: unexpected status 502"));
}

#[test]
fn history_row_is_one_line() {
    let row = DigestRow {
        run_id: "run-1".to_string(),
        edition_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 7, 5, 9).unwrap(),
        item_count: 12,
        degraded_blocks: 1,
        source_failures: 0,
    };
    assert_eq!(
        history::format_history_row(&row),
        "2026-03-02  07:05:09Z   12 items  1 degraded  0 failed sources  run-1"
    );
}
