use std::process;

use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Modify, Style, Width, object::Columns},
};

use carol_core::importer::ImportOutcome;
use carol_core::journal::Journal;
use carol_core::models::Recipe;

use super::helpers::{format_tags, short_id, truncate, warn_if_unsaved};
use crate::fetch::PageClient;

pub(crate) async fn cmd_recipe_import(
    journal: &mut Journal,
    client: &PageClient,
    url: &str,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct ImportJson<'a> {
        recipe: &'a Recipe,
        outcome: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'a str>,
        saved: bool,
    }

    let (report, status) = journal.import_recipe(client, url).await?;
    warn_if_unsaved(&status);

    let (outcome, reason) = match &report.outcome {
        ImportOutcome::Imported => ("imported", None),
        ImportOutcome::Degraded => ("degraded", None),
        ImportOutcome::Failed { reason } => ("failed", Some(reason.as_str())),
    };

    if json {
        let out = ImportJson {
            recipe: &report.recipe,
            outcome,
            reason,
            saved: status.is_saved(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let recipe = &report.recipe;
    match &report.outcome {
        ImportOutcome::Imported => {}
        ImportOutcome::Degraded => {
            eprintln!("Note: no title found on the page, using the link as the title");
        }
        ImportOutcome::Failed { reason } => {
            eprintln!("Note: could not fetch the page ({reason}); saved the link only");
        }
    }
    let title = &recipe.title;
    let id = short_id(&recipe.id);
    println!("Saved recipe: {title} (id: {id})");
    println!("  Source: {}", recipe.source_url);
    if !recipe.cover.is_empty() {
        println!("  Cover:  {}", recipe.cover);
    }

    Ok(())
}

pub(crate) fn cmd_recipe_list(journal: &Journal, json: bool) -> Result<()> {
    let recipes: Vec<&Recipe> = journal.recipes().iter().collect();
    print_recipes(&recipes, "No recipes saved yet", json)
}

pub(crate) fn cmd_recipe_search(journal: &Journal, query: &str, json: bool) -> Result<()> {
    let hits = journal.search_recipes(query);
    print_recipes(&hits, &format!("No recipes match '{}'", query.trim()), json)
}

fn print_recipes(recipes: &[&Recipe], empty_message: &str, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Tags")]
        tags: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Cover")]
        cover: String,
    }

    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(recipes)?);
        return Ok(());
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: short_id(&r.id).to_string(),
            title: truncate(&r.title, 40),
            tags: format_tags(&r.tags),
            source: truncate(&r.source_url, 50),
            cover: if r.cover.is_empty() { "" } else { "yes" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(2)).with(Width::wrap(24)))
        .to_string();
    println!("{table}");

    Ok(())
}
