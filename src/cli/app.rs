use anyhow::{Context, Result};
use sheetdb::{PersistReport, Session, SessionConfig, SheetError, Value};
use std::path::Path;

use super::{Cli, Command, PersistArgs, render};

pub fn run(cli: Cli) -> Result<()> {
    let config = session_config(&cli.persist);

    let report = match cli.command {
        Command::Show { file } => {
            let mut session = open(&file, config.create_if_missing(false))?;
            print!("{}", render::table(session.sheet()));
            session.close()?;
            return Ok(());
        }
        Command::Header { file, names } => {
            let mut session = open(&file, config)?;
            session.set_header(names)?;
            close(session, &file)?
        }
        Command::Append { file, values } => {
            let mut session = open(&file, config)?;
            let row = values.iter().map(|v| Value::infer(v)).collect();
            let index = session.append_row(row)?;
            println!("Appended row {}", index);
            close(session, &file)?
        }
        Command::Set {
            file,
            row,
            column,
            value,
        } => {
            let mut session = open(&file, config)?;
            let column = resolve_column(&session, &column)?;
            let previous = session
                .set_cell(row, column, Value::infer(&value))
                .with_context(|| format!("failed to set cell ({}, {})", row, column))?;
            println!("Replaced '{}' with '{}'", previous, value);
            close(session, &file)?
        }
        Command::DeleteRow { file, row } => {
            let mut session = open(&file, config)?;
            session
                .delete_row(row)
                .with_context(|| format!("failed to delete row {}", row))?;
            close(session, &file)?
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::report(report.as_ref()));
    }
    Ok(())
}

fn session_config(args: &PersistArgs) -> SessionConfig {
    let mut config = SessionConfig::new().sync(!args.no_sync);
    if let Some(dir) = &args.backup_dir {
        config = config.backup_dir(dir);
    }
    if let Some(dir) = &args.staging_dir {
        config = config.staging_dir(dir);
    }
    if let Some(size) = args.chunk_size {
        config = config.chunk_size(size);
    }
    config
}

fn open(file: &Path, config: SessionConfig) -> Result<Session> {
    Session::open(file, config).with_context(|| format!("failed to open {}", file.display()))
}

fn close(mut session: Session, file: &Path) -> Result<Option<PersistReport>> {
    session
        .close()
        .with_context(|| format!("failed to save {}", file.display()))
}

/// A column given as a zero-based index or a header name.
fn resolve_column(session: &Session, column: &str) -> Result<usize> {
    if let Ok(index) = column.parse::<usize>() {
        return Ok(index);
    }
    session
        .sheet()
        .column_index(column)
        .ok_or_else(|| SheetError::ColumnNotFound(column.to_string()).into())
}
