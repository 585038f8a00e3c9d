use std::path::Path;
use std::process;

use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Modify, Style, Width, object::Columns},
};

use carol_core::journal::Journal;
use carol_core::models::{Meal, MealType, NewMeal};

use super::helpers::{format_millis, format_tags, short_id, truncate, warn_if_unsaved};
use crate::photo::file_to_data_url;

pub(crate) struct MealForm<'a> {
    pub title: &'a str,
    pub meal: &'a str,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub photo: Option<&'a Path>,
}

pub(crate) fn cmd_meal_add(journal: &mut Journal, form: MealForm<'_>, json: bool) -> Result<()> {
    let meal_type: MealType = form.meal.parse()?;
    let photo_data_url = form.photo.map(file_to_data_url).transpose()?.flatten();

    let (meal, status) = journal.add_meal(NewMeal {
        meal_type,
        title: form.title.to_string(),
        notes: form.notes.unwrap_or_default(),
        tags: form.tags.unwrap_or_default(),
        photo_data_url,
    })?;
    warn_if_unsaved(&status);

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let label = meal.meal_type.label();
        let title = &meal.title;
        let id = short_id(&meal.id);
        let when = format_millis(meal.created_at);
        println!("Saved {label}: {title} (id: {id}, {when})");
        if !meal.tags.is_empty() {
            println!("  {}", format_tags(&meal.tags));
        }
    }

    Ok(())
}

pub(crate) fn cmd_meal_list(journal: &Journal, limit: Option<usize>, json: bool) -> Result<()> {
    let meals: Vec<&Meal> = journal
        .meals()
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if meals.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No meals recorded yet");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
    } else {
        print_meal_table(&meals);
    }

    Ok(())
}

fn print_meal_table(meals: &[&Meal]) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Tags")]
        tags: String,
        #[tabled(rename = "Notes")]
        notes: String,
        #[tabled(rename = "Photo")]
        photo: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: short_id(&m.id).to_string(),
            time: format_millis(m.created_at),
            meal: m.meal_type.label().to_string(),
            title: truncate(&m.title, 30),
            tags: format_tags(&m.tags),
            notes: truncate(&m.notes, 30),
            photo: if m.has_photo() { "yes" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(4)).with(Width::wrap(24)))
        .to_string();
    println!("{table}");
}
