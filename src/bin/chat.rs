//! Interactive terminal chat for sentio.

use clap::Parser;
use sentio::clusters::ClusterReport;
use sentio::export::ExportFormat;
use sentio::{ChatSession, SentioConfig};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Chat with sentio from the terminal.
#[derive(Parser)]
#[command(name = "sentio-chat", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that `/export` writes into.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

const HELP: &str = "\
Commands:
  /stats               transition matrix, statistics and recommendations
  /history             list messages so far
  /export [csv|json]   write the conversation to a file
  /clusters            render the emotion cluster plot
  /help                show this help
  /quit                leave";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SentioConfig::load_or_default(cli.config.as_deref())?;
    let _log_guard = sentio::logging::init(&config.logging)?;
    let session = ChatSession::new(&config)?;

    println!("Sentio v{}", env!("CARGO_PKG_VERSION"));
    println!("Tell me how you're feeling. Type /help for commands.\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/quit" | "/exit") => break,
            Some(cmd) if cmd.starts_with('/') => {
                match run_command(&session, line, &cli.export_dir) {
                    Ok(output) => println!("{output}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            _ => {
                match session.predict(line) {
                    Ok(turn) => println!(
                        "sentio> {}  [{} {:.0}%]",
                        turn.reply,
                        turn.prediction.label,
                        turn.prediction.confidence() * 100.0
                    ),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }
    Ok(())
}

/// Run one slash command and return what to print.
///
/// Failures are returned rather than ending the REPL, since the
/// conversation only lives in memory.
fn run_command(session: &ChatSession, line: &str, export_dir: &Path) -> sentio::Result<String> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("/help") => Ok(HELP.to_owned()),
        Some("/stats") => Ok(serde_json::to_string_pretty(&session.stats_report()?)?),
        Some("/history") => Ok(session
            .history()?
            .iter()
            .map(|item| format!("{:>4}  {:<9} {}", item.index, item.emotion, item.text))
            .collect::<Vec<_>>()
            .join("\n")),
        Some("/export") => {
            let format = match words.next() {
                Some(f) => f.parse::<ExportFormat>()?,
                None => ExportFormat::Json,
            };
            let body = session.export(format)?;
            let path = export_dir.join(format.file_name());
            std::fs::write(&path, body)?;
            Ok(format!("Exported to {}", path.display()))
        }
        Some("/clusters") => match session.generate_clusters()? {
            ClusterReport::Generated { path, points } => Ok(format!(
                "Plotted {} messages to {}",
                points.len(),
                path.display()
            )),
            report => Ok(report.message()),
        },
        Some(cmd) => Ok(format!("Unknown command {cmd}. Type /help.")),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use sentio::SentioError;
    use sentio::config::ClusterConfig;
    use sentio::responses::ResponseCatalog;
    use sentio_model::{ClassifierConfig, EmotionClassifier};

    fn session_with_clusters(dir: &Path, output_path: PathBuf) -> ChatSession {
        let classifier = EmotionClassifier::new(ClassifierConfig {
            model_dir: dir.join("models"),
            ..Default::default()
        })
        .unwrap();
        let clusters = ClusterConfig {
            output_path,
            ..Default::default()
        };
        ChatSession::from_parts(classifier, ResponseCatalog::default(), clusters)
    }

    #[test]
    fn render_failure_is_reported_and_session_survives() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("static");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let session = session_with_clusters(dir.path(), blocker.join("clusters.png"));
        for i in 0..5 {
            session.predict(&format!("message {i}")).unwrap();
        }

        let err = run_command(&session, "/clusters", dir.path()).unwrap_err();
        assert!(matches!(err, SentioError::Render(_)));

        // The conversation is still there afterwards.
        assert_eq!(session.len().unwrap(), 5);
        let history = run_command(&session, "/history", dir.path()).unwrap();
        assert_eq!(history.lines().count(), 5);
        assert!(history.contains("message 4"));
    }

    #[test]
    fn export_errors_are_returned() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_clusters(dir.path(), dir.path().join("clusters.png"));

        let err = run_command(&session, "/export csv", dir.path()).unwrap_err();
        assert!(matches!(err, SentioError::NoData(_)));
        let err = run_command(&session, "/export xml", dir.path()).unwrap_err();
        assert!(matches!(err, SentioError::InvalidInput(_)));

        session.predict("hello there").unwrap();
        let out = run_command(&session, "/export csv", dir.path()).unwrap();
        assert!(out.starts_with("Exported to"));
        assert!(dir.path().join("emotion_conversation.csv").is_file());
    }

    #[test]
    fn not_enough_data_and_unknown_commands() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_clusters(dir.path(), dir.path().join("clusters.png"));
        let out = run_command(&session, "/clusters", dir.path()).unwrap();
        assert!(out.starts_with("Not enough data for clustering"));
        let out = run_command(&session, "/bogus", dir.path()).unwrap();
        assert_eq!(out, "Unknown command /bogus. Type /help.");
    }
}
