use std::io::{self, Write};
use std::path::Path;

use crate::commands::common::open_book;
use crate::error::CliError;

pub async fn run_export(output_path: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;
    let rendered = book.export_snapshot().await?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&rendered)?;
        writeln!(stdout)?;
    }

    Ok(())
}

pub async fn run_import(input_path: &Path, db_path: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(input_path).map_err(|source| CliError::ReadInput {
        path: input_path.display().to_string(),
        source,
    })?;

    let book = open_book(db_path).await?;
    let added = book.import_snapshot(&bytes).await?;
    println!("Imported {added} quotes");
    Ok(())
}
