//! Interactive console demo for the rosterkit pipeline.
//!
//! # Responsibility
//! - Wire a console prompt and a console list surface to the core
//!   controller, making every diff operation visible as it is applied.
//! - Keep output deterministic for quick local sanity checks.

use rosterkit_core::{
    init_logging, open_db, open_db_in_memory, ControlError, ListController, ListSurface,
    PromptOutcome, PromptRequest, Record, RowRenderer, SqliteRecordStore, TextPrompt,
};
use std::error::Error;
use std::io::{self, BufRead, Write};

/// Blocking stdin prompt. EOF counts as cancellation.
struct ConsolePrompt;

impl TextPrompt for ConsolePrompt {
    fn prompt(&mut self, request: &PromptRequest) -> PromptOutcome {
        match &request.initial {
            Some(initial) => print!("{} [{initial}]: ", request.title),
            None => print!("{} ({}): ", request.title, request.placeholder),
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => PromptOutcome::Cancelled,
            Ok(_) => PromptOutcome::Confirmed(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }
}

/// Console list surface: applies row operations to an in-memory row list
/// and traces each one, marking animated operations with `~`.
#[derive(Default)]
struct ConsoleSurface {
    rows: Vec<String>,
}

impl ConsoleSurface {
    fn print_rows(&self) {
        if self.rows.is_empty() {
            println!("  (empty list)");
            return;
        }
        for (index, row) in self.rows.iter().enumerate() {
            println!("  [{index}] {row}");
        }
    }
}

fn trace_marker(animated: bool) -> &'static str {
    if animated {
        " ~"
    } else {
        ""
    }
}

impl ListSurface for ConsoleSurface {
    type Row = String;

    fn insert_row(&mut self, at: usize, row: String, animated: bool) {
        println!("  + insert [{at}] {row}{}", trace_marker(animated));
        self.rows.insert(at, row);
    }

    fn remove_row(&mut self, at: usize, animated: bool) {
        let removed = self.rows.remove(at);
        println!("  - delete [{at}] {removed}{}", trace_marker(animated));
    }

    fn move_row(&mut self, from: usize, to: usize, animated: bool) {
        let row = self.rows.remove(from);
        println!("  > move [{from}] -> [{to}] {row}{}", trace_marker(animated));
        self.rows.insert(to, row);
    }

    fn reload_row(&mut self, at: usize, row: String, animated: bool) {
        println!("  * reload [{at}] {row}{}", trace_marker(animated));
        self.rows[at] = row;
    }

    fn visible_row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Renders a record as its display name.
struct NameRenderer;

impl RowRenderer for NameRenderer {
    type Row = String;

    fn render(&mut self, record: &Record) -> String {
        record.name.clone()
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("rosterkit_cli failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let log_dir = std::env::temp_dir().join("rosterkit-cli-logs");
    if let Some(log_dir) = log_dir.to_str() {
        if let Err(err) = init_logging("info", log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    let mut controller = ListController::new(
        SqliteRecordStore::new(conn),
        ConsolePrompt,
        ConsoleSurface::default(),
        NameRenderer,
    );
    controller.start()?;

    println!(
        "rosterkit {} | a(dd), r(ename) N, d(elete) N, l(ist), q(uit)",
        rosterkit_core::core_version()
    );
    controller.surface().print_rows();

    let stdin = io::stdin();
    loop {
        print!("rosterkit> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");

        let outcome = match command {
            "a" | "add" => controller.add_item().map(|_| ()),
            "r" | "rename" => match row_id(&controller, parts.next()) {
                Some(id) => controller.rename_item(id).map(|_| ()),
                None => {
                    println!("usage: rename <row>");
                    Ok(())
                }
            },
            "d" | "delete" => match row_id(&controller, parts.next()) {
                Some(id) => controller.remove_item(id),
                None => {
                    println!("usage: delete <row>");
                    Ok(())
                }
            },
            "l" | "list" => {
                controller.surface().print_rows();
                Ok(())
            }
            "q" | "quit" => break,
            "" => Ok(()),
            other => {
                println!("unknown command `{other}`");
                Ok(())
            }
        };

        if let Err(err) = outcome {
            report_error(&err);
        }
    }

    Ok(())
}

fn row_id<S, P, V, R>(
    controller: &ListController<S, P, V, R>,
    argument: Option<&str>,
) -> Option<rosterkit_core::RecordId>
where
    S: rosterkit_core::RecordStore,
    P: TextPrompt,
    V: ListSurface,
    R: RowRenderer<Row = V::Row>,
{
    let row: usize = argument?.parse().ok()?;
    controller.applied_snapshot().ids().get(row).copied()
}

fn report_error(err: &ControlError) {
    println!("command failed: {err}");
    log::error!("event=cli_command module=cli status=error error={err}");
}
