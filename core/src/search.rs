use crate::models::Recipe;

/// Case-insensitive substring search over recipe titles and tags.
///
/// A blank query returns every recipe. Relative order is preserved.
#[must_use]
pub fn search_recipes<'a>(query: &str, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return recipes.iter().collect();
    }
    recipes
        .iter()
        .filter(|r| is_hit(r, &needle))
        .collect()
}

fn is_hit(recipe: &Recipe, needle: &str) -> bool {
    recipe.title.to_lowercase().contains(needle)
        || recipe.tags.iter().any(|t| t.to_lowercase().contains(needle))
}
