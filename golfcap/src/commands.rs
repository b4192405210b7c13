use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use handicap::{format_index, EngineConfig, PlayerId};
use handicap_server::config;
use handicap_server::persistence::sqlite::Database;
use handicap_server::persistence::{PlayerRepository, TeeSetId};
use handicap_server::{
    import_fixture, rebuild_all, Fixture, HandicapQueries, RecomputeService, TimelineResult,
};

use crate::{CliError, Command};

pub async fn run(
    command: Command,
    db: &Database,
    engine: EngineConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let repos = db.repositories();
    let service = Arc::new(RecomputeService::new(repos.clone(), engine));
    let queries = HandicapQueries::new(repos);

    match command {
        Command::Import { file } => {
            let fixture = Fixture::from_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let report = import_fixture(&service, &fixture).await?;
            writeln!(
                out,
                "Imported {} tee set(s), {} player(s), {} round(s), {} manual entries",
                report.tee_sets.len(),
                report.players.len(),
                report.rounds,
                report.manual_entries
            )?;
            for timeline in report.failed_players() {
                write_diagnostics(out, timeline)?;
            }
        }
        Command::Rebuild { workers } => {
            let workers = workers.unwrap_or_else(config::get_worker_count);
            let report = rebuild_all(service, workers).await?;
            writeln!(
                out,
                "Rebuilt {} of {} player(s)",
                report.succeeded.len(),
                report.total()
            )?;
            for failure in &report.failed {
                writeln!(out, "  player {}: {}", failure.player_id, failure.reason)?;
            }
            if !report.failed.is_empty() {
                return Err(CliError::RebuildFailed {
                    failed: report.failed.len(),
                    total: report.total(),
                }
                .into());
            }
        }
        Command::Recompute { player, from } => {
            let player = PlayerId(player);
            let result = match from {
                Some(date) => service.recompute_from(player, date).await?,
                None => service.recompute_player_timeline(player).await?,
            };
            if result.is_ok() {
                writeln!(
                    out,
                    "Player {player}: replayed {} round(s), index {}",
                    result.rounds_replayed,
                    format_index(result.current_index())
                )?;
            } else {
                write_diagnostics(out, &result)?;
                anyhow::bail!("player {player} history left unchanged");
            }
        }
        Command::Show { player, last } => {
            let player = PlayerId(player);
            let current = queries.current_index(player).await?;
            writeln!(out, "Player {player}: {current}")?;

            let recent = queries.recent_differentials(player, last).await?;
            if !recent.is_empty() {
                writeln!(out, "{:<12} {:>6} {:>5} {:>5} {:>6}", "date", "round", "gross", "adj", "diff")?;
            }
            for detail in recent {
                let r = &detail.record;
                writeln!(
                    out,
                    "{:<12} {:>6} {:>5} {:>5} {:>6.1} {}{}",
                    r.date.to_string(),
                    r.round_id.to_string(),
                    r.gross_score,
                    r.adjusted_gross_score,
                    r.differential,
                    if detail.counts_toward_index { "*" } else { " " },
                    if r.is_nine_hole { " (9)" } else { "" }
                )?;
            }
        }
        Command::Project { player, tee } => {
            let projection = queries
                .projected_handicap(PlayerId(player), TeeSetId(tee))
                .await?;
            writeln!(
                out,
                "{} {} (index {}): course handicap {}, playing handicap {}",
                projection.tee.course_name,
                projection.tee.tee_name,
                format_index(Some(projection.index)),
                projection.course_handicap,
                projection.playing_handicap
            )?;
        }
        Command::Players => {
            for player in service.repositories().players.list_players().await? {
                writeln!(out, "{:>6}  {}", player.player_id.to_string(), player.name)?;
            }
        }
    }
    Ok(())
}

fn write_diagnostics(out: &mut impl Write, timeline: &TimelineResult) -> std::io::Result<()> {
    for diagnostic in &timeline.errors {
        writeln!(out, "  player {}: {}", timeline.player_id, diagnostic.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use handicap_server::persistence::{NewTeeSet, TeeSetRepository};

    const FIXTURE: &str = r#"{
        "tee_sets": [
            { "key": "muni", "course_name": "Muni", "tee_name": "White",
              "course_rating": 72.0, "slope_rating": 113.0, "par": 72 },
            { "key": "oak", "course_name": "Oak Hill", "tee_name": "Blue",
              "course_rating": 72.3, "slope_rating": 138.0, "par": 72 }
        ],
        "players": [
            { "name": "Ada", "rounds": [
                { "tee": "muni", "date": "2024-04-01", "pars": [4,4,3,5,4,4,3,4,5,4,4,3,5,4,4,3,4,5],
                  "strokes": [5,5,4,6,5,5,4,5,6,5,5,4,6,5,4,3,4,5] },
                { "tee": "muni", "date": "2024-04-08", "pars": [4,4,3,5,4,4,3,4,5,4,4,3,5,4,4,3,4,5],
                  "strokes": [5,5,4,6,5,5,4,5,6,5,5,4,6,5,5,3,4,5] },
                { "tee": "muni", "date": "2024-04-15", "pars": [4,4,3,5,4,4,3,4,5,4,4,3,5,4,4,3,4,5],
                  "strokes": [5,5,4,6,5,5,4,5,6,5,5,4,6,5,5,4,4,5] }
            ] }
        ]
    }"#;

    async fn open(dir: &tempfile::TempDir) -> Database {
        Database::open(&dir.path().join("golfcap.db")).await.unwrap()
    }

    async fn run_to_string(command: Command, db: &Database) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(command, db, EngineConfig::default(), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_import_show_and_project() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let fixture = dir.path().join("fixture.json");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let imported = run_to_string(Command::Import { file: fixture }, &db).await.unwrap();
        assert!(imported.starts_with("Imported 2 tee set(s), 1 player(s), 3 round(s)"));

        // Differentials 14, 15, 16: lowest minus 2.0
        let shown = run_to_string(Command::Show { player: 1, last: 5 }, &db)
            .await
            .unwrap();
        assert!(shown.contains("Player 1: 12.0 (as of 2024-04-15)"));
        assert_eq!(shown.lines().filter(|l| l.contains('*')).count(), 1);

        let projected = run_to_string(Command::Project { player: 1, tee: 2 }, &db)
            .await
            .unwrap();
        // 12.0 * 138 / 113 = 14.65 -> 15, 15 + 0.3 -> 15
        assert!(projected.contains("course handicap 15, playing handicap 15"));
    }

    #[tokio::test]
    async fn test_project_without_index_names_the_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let repos = db.repositories();
        repos.players.create_player("Bo").await.unwrap();
        repos
            .tees
            .create_tee_set(&NewTeeSet {
                course_name: "Muni".into(),
                tee_name: "White".into(),
                course_rating: 72.0,
                slope_rating: 113.0,
                par: 72,
            })
            .await
            .unwrap();

        let err = run_to_string(Command::Project { player: 1, tee: 1 }, &db)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at least 3"));

        let shown = run_to_string(Command::Show { player: 1, last: 5 }, &db)
            .await
            .unwrap();
        assert!(shown.contains("N/A (insufficient rounds: 0 of 3)"));
    }

    #[tokio::test]
    async fn test_rebuild_and_recompute_report() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let fixture = dir.path().join("fixture.json");
        std::fs::write(&fixture, FIXTURE).unwrap();
        run_to_string(Command::Import { file: fixture }, &db).await.unwrap();

        let rebuilt = run_to_string(Command::Rebuild { workers: Some(2) }, &db)
            .await
            .unwrap();
        assert!(rebuilt.contains("Rebuilt 1 of 1 player(s)"));

        let recomputed = run_to_string(Command::Recompute { player: 1, from: None }, &db)
            .await
            .unwrap();
        assert!(recomputed.contains("replayed 3 round(s), index 12.0"));

        let listed = run_to_string(Command::Players, &db).await.unwrap();
        assert!(listed.contains("Ada"));
    }

    #[tokio::test]
    async fn test_missing_fixture_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let err = run_to_string(
            Command::Import {
                file: dir.path().join("nope.json"),
            },
            &db,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
