use std::path::Path;

use crate::commands::common::{format_quote_lines, open_book, quote_to_list_item, QuoteListItem};
use crate::error::CliError;

pub async fn run_list(category: Option<&str>, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;
    let quotes = book.list_quotes(category).await;

    if as_json {
        let json_items = quotes
            .iter()
            .map(quote_to_list_item)
            .collect::<Vec<QuoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_quote_lines(&quotes) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_categories(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;
    let categories = book.categories().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else {
        for category in categories {
            println!("{category}");
        }
    }

    Ok(())
}
