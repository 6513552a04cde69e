//! QuickNote command line front end.
//!
//! # Responsibility
//! - Parse arguments into one user action against `quicknote_core`.
//! - Perform the initial load, run the action, print the rendered screen.
//!
//! # Invariants
//! - An unreachable backend is not a failure; the offline path is reported
//!   through the rendered banner and notices.
//! - Argument, validation and unknown-id errors exit with status 1.

use clap::{Parser, Subcommand};
use log::info;
use quicknote_core::view::{render_screen, submit_label};
use quicknote_core::{
    default_log_level, init_logging, ClientConfig, FormMode, HttpNotesApi, KeyValueStore,
    NoteDraft, NoteId, NoteValidationError, NotesApi, NotesController, SqliteKeyValueStore,
    SyncOutcome,
};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

type Controller = NotesController<HttpNotesApi, SqliteKeyValueStore>;
type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "quicknote", version, about = "Notes with a remote API and offline fallback")]
struct Cli {
    /// Base URL of the notes API; omit to work locally only.
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Directory holding the fallback database.
    #[arg(long, global = true, default_value = ".quicknote")]
    data_dir: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Rolling log directory (defaults to `<data-dir>/logs`).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all notes.
    List,
    /// Show one note in full.
    Show { id: String },
    /// Create a note.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Edit a note; omitted fields keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// A parsed command whose user input has already been validated.
#[derive(Debug)]
enum Action {
    List,
    Show(NoteId),
    Add(NoteDraft),
    Edit {
        id: NoteId,
        title: Option<String>,
        content: Option<String>,
    },
    Delete {
        id: NoteId,
        yes: bool,
    },
}

impl Action {
    fn from_command(command: Command) -> Result<Self, NoteValidationError> {
        Ok(match command {
            Command::List => Self::List,
            Command::Show { id } => Self::Show(parse_id(&id)),
            Command::Add { title, content } => Self::Add(NoteDraft::new(title, content)?),
            Command::Edit { id, title, content } => {
                if title.as_deref().is_some_and(|title| title.trim().is_empty()) {
                    return Err(NoteValidationError::TitleRequired);
                }
                Self::Edit {
                    id: parse_id(&id),
                    title,
                    content,
                }
            }
            Command::Delete { id, yes } => Self::Delete {
                id: parse_id(&id),
                yes,
            },
        })
    }
}

fn main() -> ExitCode {
    let result = run(Cli::parse());
    if let Err(err) = &result {
        eprintln!("error: {err}");
    }
    ExitCode::from(exit_status(&result))
}

fn exit_status(result: &CliResult) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn run(cli: Cli) -> CliResult {
    let config = ClientConfig::new(cli.api_base.as_deref(), &cli.data_dir)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs));
    start_logging(&config, cli.log_level.as_deref(), cli.log_dir.as_deref());

    // Validate before touching any store.
    let action = Action::from_command(cli.command)?;
    let mut controller = Controller::from_config(&config)?;
    let mut stdout = std::io::stdout().lock();
    execute(&mut controller, action, &mut stdout, confirm)
}

/// Loads the list, applies `action`, and writes the rendered screen.
fn execute<A: NotesApi, S: KeyValueStore>(
    controller: &mut NotesController<A, S>,
    action: Action,
    out: &mut impl Write,
    confirm: impl FnOnce(&str) -> bool,
) -> CliResult {
    controller.refresh();

    match action {
        Action::List => {}
        Action::Show(id) => controller.start_edit(&id)?,
        Action::Add(draft) => {
            let outcome = controller.create(&draft);
            report(out, outcome, FormMode::Add)?;
        }
        Action::Edit { id, title, content } => {
            controller.start_edit(&id)?;
            let draft = merged_draft(controller, title, content)?;
            let outcome = controller.update(&draft);
            report(out, outcome, FormMode::Edit)?;
        }
        Action::Delete { id, yes } => {
            let outcome = controller.delete(&id, |prompt| yes || confirm(prompt))?;
            if outcome == SyncOutcome::Cancelled {
                writeln!(out, "Cancelled.")?;
            }
        }
    }

    write!(out, "{}", render_screen(controller.state()))?;
    Ok(())
}

/// Fills omitted edit fields from the selected note.
fn merged_draft<A: NotesApi, S: KeyValueStore>(
    controller: &NotesController<A, S>,
    title: Option<String>,
    content: Option<String>,
) -> Result<NoteDraft, Box<dyn Error>> {
    let selected = controller
        .state()
        .selected
        .as_ref()
        .ok_or("no note selected")?;
    let title = title.unwrap_or_else(|| selected.title.clone());
    let content = content.unwrap_or_else(|| selected.content.clone());
    Ok(NoteDraft::new(title, content)?)
}

fn report(out: &mut impl Write, outcome: SyncOutcome, mode: FormMode) -> std::io::Result<()> {
    match outcome {
        SyncOutcome::Synced => writeln!(out, "{}: done.", submit_label(mode, false)),
        SyncOutcome::Local => writeln!(out, "{}: kept on this device.", submit_label(mode, false)),
        SyncOutcome::Rejected | SyncOutcome::Cancelled | SyncOutcome::Skipped => Ok(()),
    }
}

/// Ids typed on the command line are text; numeric server ids still match
/// because ids compare by their string form.
fn parse_id(raw: &str) -> NoteId {
    NoteId::from(raw.trim())
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn start_logging(config: &ClientConfig, level: Option<&str>, log_dir: Option<&Path>) {
    let log_dir = log_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.default_log_dir());
    let log_dir = if log_dir.is_absolute() {
        log_dir
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(log_dir),
            Err(err) => {
                eprintln!("warning: logging disabled: {err}");
                return;
            }
        }
    };

    let level = level.unwrap_or_else(|| default_log_level());
    if let Err(err) = init_logging(level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
        return;
    }
    if config.api_base.is_none() {
        info!("event=cli_start module=cli status=ok mode=local_only");
    }
}

#[cfg(test)]
mod tests {
    use super::{execute, exit_status, merged_draft, parse_id, Action, Cli, Command};
    use clap::Parser;
    use quicknote_core::{
        ApiError, ApiResult, ControllerError, LocalFallback, MemoryKeyValueStore, NoteDraft,
        NoteId, NoteValidationError, NotesApi, NotesController,
    };
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays queued responses and records submitted drafts.
    #[derive(Default)]
    struct ScriptedApi {
        responses: RefCell<VecDeque<ApiResult<Value>>>,
        drafts: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedApi {
        fn next(&self) -> ApiResult<Value> {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ApiError::NoBaseUrl))
        }

        fn record(&self, draft: &NoteDraft) {
            self.drafts
                .borrow_mut()
                .push((draft.title().to_string(), draft.content().to_string()));
        }
    }

    impl NotesApi for ScriptedApi {
        fn list_notes(&self) -> ApiResult<Value> {
            self.next()
        }

        fn create_note(&self, draft: &NoteDraft) -> ApiResult<Value> {
            self.record(draft);
            self.next()
        }

        fn update_note(&self, _id: &NoteId, draft: &NoteDraft) -> ApiResult<Value> {
            self.record(draft);
            self.next()
        }

        fn delete_note(&self, _id: &NoteId) -> ApiResult<Value> {
            self.next()
        }
    }

    type TestController = NotesController<ScriptedApi, MemoryKeyValueStore>;

    fn controller(responses: Vec<ApiResult<Value>>) -> TestController {
        let api = ScriptedApi {
            responses: RefCell::new(responses.into()),
            ..ScriptedApi::default()
        };
        NotesController::new(api, LocalFallback::new(MemoryKeyValueStore::new()))
    }

    fn action(args: &[&str]) -> Result<Action, NoteValidationError> {
        let cli = Cli::try_parse_from(std::iter::once("quicknote").chain(args.iter().copied()))
            .unwrap();
        Action::from_command(cli.command)
    }

    fn run_action(
        controller: &mut TestController,
        args: &[&str],
        answer: bool,
    ) -> (u8, String) {
        let mut out = Vec::new();
        let result = execute(controller, action(args).unwrap(), &mut out, |_| answer);
        (exit_status(&result), String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quicknote",
            "add",
            "--title",
            "Hello",
            "--api-base",
            "http://localhost:3001",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:3001"));
        assert!(matches!(cli.command, Command::Add { ref title, .. } if title == "Hello"));
    }

    #[test]
    fn delete_defaults_to_prompting() {
        let cli = Cli::try_parse_from(["quicknote", "delete", "42"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { yes: false, .. }));
    }

    #[test]
    fn parse_id_matches_numeric_server_ids() {
        assert_eq!(parse_id(" 42 "), NoteId::Number(42));
    }

    #[test]
    fn blank_titles_are_rejected_before_any_store_is_opened() {
        let add = action(&["add", "--title", "   "]).unwrap_err();
        assert_eq!(add, NoteValidationError::TitleRequired);
        let edit = action(&["edit", "1", "--title", ""]).unwrap_err();
        assert_eq!(edit, NoteValidationError::TitleRequired);
        assert!(action(&["edit", "1", "--content", "only body"]).is_ok());
    }

    #[test]
    fn edit_fills_omitted_fields_from_selected_note() {
        let mut controller = controller(vec![
            Ok(json!([{"id": 1, "title": "Old", "content": "Body"}])),
            Ok(json!({"id": 1, "title": "New", "content": "Body"})),
        ]);

        let (status, out) = run_action(&mut controller, &["edit", "1", "--title", "New"], true);

        assert_eq!(status, 0);
        assert!(out.starts_with("Save changes: done."));
        assert_eq!(
            *controller.api().drafts.borrow(),
            vec![("New".to_string(), "Body".to_string())]
        );
    }

    #[test]
    fn merged_draft_keeps_both_fields_when_none_given() {
        let mut controller = controller(vec![Ok(json!([
            {"id": "a", "title": "Title", "content": "Text"}
        ]))]);
        controller.refresh();
        controller.start_edit(&NoteId::from("a")).unwrap();

        let draft = merged_draft(&controller, None, None).unwrap();
        assert_eq!((draft.title(), draft.content()), ("Title", "Text"));
    }

    #[test]
    fn unknown_id_exits_with_failure() {
        let mut controller = controller(vec![Ok(json!([]))]);
        let mut out = Vec::new();

        let result = execute(
            &mut controller,
            action(&["show", "9"]).unwrap(),
            &mut out,
            |_| true,
        );

        assert_eq!(exit_status(&result), 1);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ControllerError>(),
            Some(ControllerError::NoteNotFound(id)) if *id == NoteId::from("9")
        ));
    }

    #[test]
    fn unreachable_backend_still_succeeds() {
        let mut controller = controller(Vec::new());

        let (status, out) = run_action(&mut controller, &["add", "--title", "Offline"], true);

        assert_eq!(status, 0);
        assert!(out.starts_with("Add note: kept on this device."));
        assert!(out.contains("Offline mode: Using local storage fallback."));
        assert_eq!(controller.fallback().load_notes().len(), 1);
    }

    #[test]
    fn declined_delete_prints_cancelled() {
        let mut controller = controller(vec![Ok(json!([
            {"id": 1, "title": "Keep me", "content": ""}
        ]))]);

        let (status, out) = run_action(&mut controller, &["delete", "1"], false);

        assert_eq!(status, 0);
        assert!(out.starts_with("Cancelled.\n"));
        assert_eq!(controller.state().notes.len(), 1);
    }

    #[test]
    fn delete_with_yes_skips_the_prompt() {
        let mut controller = controller(vec![
            Ok(json!([{"id": 1, "title": "Gone", "content": ""}])),
            Ok(Value::Null),
        ]);

        let (status, out) = run_action(&mut controller, &["delete", "1", "--yes"], false);

        assert_eq!(status, 0);
        assert!(!out.contains("Cancelled."));
        assert!(controller.state().notes.is_empty());
    }
}
