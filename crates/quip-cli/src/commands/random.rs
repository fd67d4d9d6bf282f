use std::path::Path;

use crate::commands::common::{format_quote, open_book};
use crate::error::CliError;

pub async fn run_random(category: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;
    let filter = match category {
        Some(category) => Some(category.to_string()),
        None => book.category_filter().await?,
    };

    match book.get_random_quote(filter.as_deref()).await {
        Some(quote) => {
            println!("{}", format_quote(&quote));
            Ok(())
        }
        None => match filter {
            Some(category) => Err(CliError::NoMatchingQuote(category)),
            None => Err(CliError::EmptyCollection),
        },
    }
}

pub async fn run_filter(category: Option<&str>, clear: bool, db_path: &Path) -> Result<(), CliError> {
    let book = open_book(db_path).await?;

    if clear {
        book.set_category_filter(None).await?;
        println!("Category filter cleared");
    } else if let Some(category) = category {
        match book.set_category_filter(Some(category)).await? {
            Some(saved) => println!("Category filter set to {saved}"),
            None => println!("Category filter cleared"),
        }
    } else {
        match book.category_filter().await? {
            Some(saved) => println!("{saved}"),
            None => println!("No category filter set"),
        }
    }

    Ok(())
}
