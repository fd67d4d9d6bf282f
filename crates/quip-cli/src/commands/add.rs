use std::path::Path;

use crate::commands::common::open_book;
use crate::error::CliError;

pub async fn run_add(text_parts: &[String], category: &str, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;
    let quote = book.add_quote(&text_parts.join(" "), category).await?;

    if let Some(id) = &quote.id {
        println!("{id}");
    }
    Ok(())
}
