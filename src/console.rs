//! Interactive operator console.
//!
//! Reads one command per line from stdin and works on the same session store and pending queue as
//! the REST server, so an operator can search and review while agents keep pushing records.

use std::path::PathBuf;

use api_rest::AppState;
use scout_core::{CandidateRecord, ScoutError, StoreMode};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_EXPORT_PATH: &str = "scout_session.csv";

const HELP: &str = "\
commands:
  search <query>      grounded search; replaces the session
  search+ <query>     grounded search; appends to the session
  parse <file>        parse a raw batch file into the session (no generation call)
  session             list session records
  names               list distinct names in the session
  invite <name>       draft an invitation for a session record
  export [file]       write the session as CSV (default scout_session.csv)
  queue <name>        queue a session record for review
  pending             list records waiting for review
  commit [id]         commit the whole pending queue, or one record
  clear               discard every pending record
  help | quit";

/// One parsed console line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Search { query: String, mode: StoreMode },
    Parse(PathBuf),
    Session,
    Names,
    Invite(String),
    Export(PathBuf),
    Queue(String),
    Pending,
    Commit(Option<String>),
    Clear,
    Help,
    Quit,
}

impl Command {
    /// Parses a console line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_ascii_lowercase().as_str(), rest) {
            ("search", "") | ("search+", "") => return Err("usage: search <query>".into()),
            ("search", q) => Command::Search {
                query: q.to_string(),
                mode: StoreMode::Replace,
            },
            ("search+", q) => Command::Search {
                query: q.to_string(),
                mode: StoreMode::Append,
            },
            ("parse", "") => return Err("usage: parse <file>".into()),
            ("parse", path) => Command::Parse(PathBuf::from(path)),
            ("session", _) => Command::Session,
            ("names", _) => Command::Names,
            ("invite", "") => return Err("usage: invite <name>".into()),
            ("invite", name) => Command::Invite(name.to_string()),
            ("export", "") => Command::Export(PathBuf::from(DEFAULT_EXPORT_PATH)),
            ("export", path) => Command::Export(PathBuf::from(path)),
            ("queue", "") => return Err("usage: queue <name>".into()),
            ("queue", name) => Command::Queue(name.to_string()),
            ("pending", _) => Command::Pending,
            ("commit", "") => Command::Commit(None),
            ("commit", id) => Command::Commit(Some(id.to_string())),
            ("clear", _) => Command::Clear,
            ("help", _) | ("?", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            (other, _) => return Err(format!("unknown command {other:?}; try `help`")),
        };
        Ok(Some(command))
    }
}

/// Runs one command and returns the text to show the operator.
///
/// Failures are reported in the returned text; nothing here ends the console.
pub async fn execute(state: &AppState, command: Command) -> String {
    match command {
        Command::Search { query, mode } => {
            match state.pipeline.search(&query, &state.session, mode).await {
                Ok(report) => {
                    let mut out = list(&report.records);
                    for notice in report.notices {
                        out.push_str(&format!("\nnotice: {notice}"));
                    }
                    out
                }
                Err(ScoutError::GenerationUnconfigured) => {
                    "search unavailable: GEMINI_API_KEY is not set".into()
                }
                Err(e) => format!("search failed: {e}"),
            }
        }
        Command::Parse(path) => match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let report = state
                    .pipeline
                    .ingest_text(&raw, &state.session, StoreMode::Replace)
                    .await;
                list(&report.records)
            }
            Err(e) => format!("cannot read {}: {e}", path.display()),
        },
        Command::Session => list(&state.session.snapshot()),
        Command::Names => {
            let names = state.session.unique_names();
            if names.is_empty() {
                "no records".into()
            } else {
                names.join("\n")
            }
        }
        Command::Invite(name) => match state.pipeline.draft_invite(&state.session, &name).await {
            Ok(invite) => invite.message,
            Err(e) => format!("invite failed: {e}"),
        },
        Command::Export(path) => match state.session.export_csv() {
            Ok(csv) => match tokio::fs::write(&path, csv).await {
                Ok(()) => format!(
                    "exported {} record(s) to {}",
                    state.session.len(),
                    path.display()
                ),
                Err(e) => format!("cannot write {}: {e}", path.display()),
            },
            Err(e) => format!("export failed: {e}"),
        },
        Command::Queue(name) => match state.bridge.queue_from_session(&state.session, &name) {
            Ok(receipt) => format!("queued {} ({} pending)", receipt.id, receipt.queued),
            Err(e) => format!("queue failed: {e}"),
        },
        Command::Pending => list(&state.bridge.pending()),
        Command::Commit(id) => {
            let result = match id {
                None => state.bridge.commit_all().await,
                Some(id) => match uuid::Uuid::parse_str(&id) {
                    Ok(id) => state.bridge.commit_one(id).await,
                    Err(e) => return format!("invalid id {id:?}: {e}"),
                },
            };
            match result {
                Ok(report) => format!(
                    "committed {} record(s) to {}; {} still pending",
                    report.committed.len(),
                    state.bridge.backend(),
                    report.remaining
                ),
                Err(e) => format!(
                    "commit failed: {e}; {} record(s) still pending",
                    state.bridge.pending_len()
                ),
            }
        }
        Command::Clear => format!("cleared {} pending record(s)", state.bridge.clear_pending()),
        Command::Help => HELP.into(),
        Command::Quit => String::new(),
    }
}

fn list(records: &[CandidateRecord]) -> String {
    if records.is_empty() {
        return "no records".into();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "{}  {:<28} {:>3} {:<8} {:<20} {}  [{}]",
                r.id,
                r.name,
                r.score().value(),
                r.tier().as_str(),
                r.category,
                r.identifier,
                r.status()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => println!("{}", execute(&state, command).await),
            Err(usage) => println!("{usage}"),
        }
    }

    tracing::info!("operator console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{
        CandidatePipeline, CommitGateway, CoreConfig, IngestionBridge, IngestPayload, MemorySink,
        SessionStore,
    };
    use std::sync::Arc;

    fn state(sink: Arc<MemorySink>) -> AppState {
        AppState {
            pipeline: Arc::new(CandidatePipeline::new(&CoreConfig::default(), None)),
            session: Arc::new(SessionStore::new()),
            bridge: Arc::new(IngestionBridge::new(CommitGateway::new(sink))),
            api_key: None,
        }
    }

    fn queue(state: &AppState, name: &str) {
        state
            .bridge
            .receive(IngestPayload {
                name: Some(name.into()),
                score: Some(serde_json::json!(70)),
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("search+ cardiology speakers").unwrap(),
            Some(Command::Search {
                query: "cardiology speakers".into(),
                mode: StoreMode::Append
            })
        );
        assert_eq!(
            Command::parse("export").unwrap(),
            Some(Command::Export(PathBuf::from(DEFAULT_EXPORT_PATH)))
        );
        assert_eq!(Command::parse("commit").unwrap(), Some(Command::Commit(None)));
        assert_eq!(
            Command::parse("queue Dr. Ana Li").unwrap(),
            Some(Command::Queue("Dr. Ana Li".into()))
        );
        assert_eq!(Command::parse("names").unwrap(), Some(Command::Names));
        assert!(Command::parse("queue").is_err());
        assert!(Command::parse("search").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[tokio::test]
    async fn commit_reports_failure_and_keeps_queue() {
        let sink = Arc::new(MemorySink::new());
        let state = state(sink.clone());
        queue(&state, "Jo Park");
        sink.set_failure(Some("sheet offline"));

        let out = execute(&state, Command::Commit(None)).await;
        assert!(out.contains("sheet offline"), "{out}");
        assert_eq!(state.bridge.pending_len(), 1);

        sink.set_failure(None);
        let out = execute(&state, Command::Commit(None)).await;
        assert!(out.starts_with("committed 1 record(s)"), "{out}");
    }

    #[tokio::test]
    async fn parse_file_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.txt");
        std::fs::write(
            &input,
            "### Dr. Ana Li\nTYPE: Cardiologist\nKeynote speaker at TED.|||",
        )
        .unwrap();
        let state = state(Arc::new(MemorySink::new()));

        let out = execute(&state, Command::Parse(input)).await;
        assert!(out.contains("Dr. Ana Li"), "{out}");

        let output = dir.path().join("out.csv");
        let out = execute(&state, Command::Export(output.clone())).await;
        assert!(out.starts_with("exported 1 record(s)"), "{out}");
        assert!(std::fs::read_to_string(output)
            .unwrap()
            .starts_with("name,identifier"));
    }

    #[tokio::test]
    async fn search_without_generator_is_explained() {
        let state = state(Arc::new(MemorySink::new()));
        let out = execute(
            &state,
            Command::Search {
                query: "x".into(),
                mode: StoreMode::Replace,
            },
        )
        .await;
        assert!(out.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn clear_discards_pending() {
        let state = state(Arc::new(MemorySink::new()));
        queue(&state, "A");
        queue(&state, "B");
        assert_eq!(
            execute(&state, Command::Clear).await,
            "cleared 2 pending record(s)"
        );
    }

    #[tokio::test]
    async fn queue_session_record_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.txt");
        std::fs::write(
            &input,
            "### Dr. Ana Li\nTYPE: Cardiologist\nKeynote speaker at TED.|||\
             ### Dr. Ana Li\nTYPE: Surgeon\nPublished author and podcast host.",
        )
        .unwrap();
        let sink = Arc::new(MemorySink::new());
        let state = state(sink.clone());
        execute(&state, Command::Parse(input)).await;

        assert_eq!(execute(&state, Command::Names).await, "Dr. Ana Li");

        let out = execute(&state, Command::Queue("Dr. Ana Li".into())).await;
        assert!(out.starts_with("queued "), "{out}");
        assert!(out.ends_with("(1 pending)"), "{out}");

        let out = execute(&state, Command::Queue("Dr. Ana Li".into())).await;
        assert!(out.contains("already pending"), "{out}");
        let out = execute(&state, Command::Queue("Nobody".into())).await;
        assert!(out.starts_with("queue failed"), "{out}");

        execute(&state, Command::Commit(None)).await;
        assert_eq!(sink.rows()[0].category, "Cardiologist");
    }
}
