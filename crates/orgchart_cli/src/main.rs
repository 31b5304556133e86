//! Command-line entry point for the org chart store.
//!
//! # Responsibility
//! - Map subcommands onto `DepartmentService` operations.
//! - Print results as pretty JSON; print failures with their status class.

use clap::{Parser, Subcommand};
use log::error;
use orgchart_core::db::open_db;
use orgchart_core::{
    default_log_level, init_logging, AttachRequest, DepartmentFilter, DepartmentPatch,
    DepartmentService, DepartmentServiceError, NewDepartment, SqliteDepartmentRepository,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "orgchart", version, about = "Department hierarchy store and org chart renderer")]
struct Args {
    /// SQLite database file
    #[arg(long, default_value = "orgchart.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when omitted
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List active departments
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Show one department
    Show { id: String },
    /// Create a root department
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Update name/description
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Soft-delete a department and detach its subtree
    Delete { id: String },
    /// Attach CHILD under PARENT
    Attach { parent: String, child: String },
    /// Print the materialized subtree
    Tree { id: String },
    /// Print the departments at a 1-based level under a root
    Level { id: String, level: u32 },
    /// Print parent/children associations under a root
    Links { id: String },
    /// Render the org chart and cache it on the root
    Render {
        id: String,
        /// Write the SVG here instead of printing the stored record
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(message) = init_logging(&level, args.log_dir.as_deref()) {
        eprintln!("logging disabled: {message}");
    }

    match run(args) {
        Ok(value) => {
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{text}"),
                Err(err) => eprintln!("cannot format output: {err}"),
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<Value, String> {
    let conn = open_db(&args.db).map_err(|err| format!("cannot open database: {err}"))?;
    let repo = SqliteDepartmentRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = DepartmentService::new(repo);

    let result = match args.command {
        Command::List { name, parent } => service
            .list_departments(&DepartmentFilter { name, parent })
            .map(to_json),
        Command::Show { id } => service.get_department(&id).map(to_json),
        Command::Create {
            name,
            description,
            id,
            owner,
        } => service
            .create_department(NewDepartment {
                id,
                name,
                description,
                owner_ref: owner,
            })
            .map(to_json),
        Command::Update {
            id,
            name,
            description,
        } => service
            .update_department(
                &id,
                DepartmentPatch {
                    name,
                    description,
                    owner_ref: None,
                },
            )
            .map(to_json),
        Command::Delete { id } => service.remove_department(&id).map(to_json),
        Command::Attach { parent, child } => service
            .attach(&AttachRequest {
                parent_id: parent,
                child_id: child,
            })
            .map(to_json),
        Command::Tree { id } => service.subtree(&id).map(to_json),
        Command::Level { id, level } => service.level_members(&id, level).map(to_json),
        Command::Links { id } => service.associations(&id).map(to_json),
        Command::Render { id, output } => {
            let rendered = service.render_diagram(&id).map_err(describe)?;
            return match output {
                Some(path) => {
                    std::fs::write(&path, rendered.svg.as_bytes())
                        .map_err(|err| format!("cannot write {}: {err}", path.display()))?;
                    Ok(serde_json::json!({
                        "id": rendered.department.id,
                        "output": path,
                        "width": rendered.width,
                        "height": rendered.height,
                    }))
                }
                None => Ok(to_json(rendered.department)),
            };
        }
    };

    result.map_err(describe)
}

fn to_json(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        error!("event=cli_output module=cli status=error error={err}");
        Value::Null
    })
}

fn describe(err: DepartmentServiceError) -> String {
    format!("error[{}]: {err}", err.kind().as_str())
}
