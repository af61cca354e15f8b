//! Prompt loop for looking up addresses as you type them.

use dialoguer::{Confirm, Input};
use netinv_address::SuggestionService;
use netinv_address_models::{SearchPage, SuggestionCandidate};

/// Runs the lookup loop until an empty line is entered.
///
/// Each query shows one page of `default_limit` suggestions, and further
/// pages are offered while the previous one came back full. Search
/// failures are logged and the loop keeps going.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails.
pub async fn run(service: &SuggestionService) -> Result<(), Box<dyn std::error::Error>> {
    println!("Address search (empty line to quit)");
    println!();

    let limit = i64::from(service.config().default_limit);

    loop {
        let text: String = Input::new()
            .with_prompt("Address")
            .allow_empty(true)
            .interact_text()?;
        let text = text.trim();
        if text.is_empty() {
            break;
        }

        let mut offset = 0;
        loop {
            let page = match service.search(text, offset, limit).await {
                Ok(page) => page,
                Err(e) => {
                    log::error!("Search failed: {e}");
                    break;
                }
            };

            print_page(&page);

            if page.candidates.len() < page.limit as usize
                || !Confirm::new()
                    .with_prompt("Show more?")
                    .default(false)
                    .interact()?
            {
                break;
            }
            offset += limit;
        }
    }

    Ok(())
}

fn print_page(page: &SearchPage) {
    if page.candidates.is_empty() {
        println!("  No matching addresses");
        return;
    }

    for candidate in &page.candidates {
        println!("  {}", format_candidate(candidate));
    }
    if let Some(total) = page.total {
        println!("  ({total} total)");
    }
}

/// One-line rendering of a candidate with its resource counts.
#[must_use]
pub fn format_candidate(candidate: &SuggestionCandidate) -> String {
    let resources = &candidate.resources;
    format!(
        "{} {}, {} {}  [#{}: {} docs, {} nodes, {} hw]",
        candidate.street.type_short_name,
        candidate.street.name,
        candidate.house.type_short_name,
        candidate.house.name,
        candidate.house.id,
        resources.documents,
        resources.nodes,
        resources.hardware,
    )
}
