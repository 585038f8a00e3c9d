mod helpers;
mod meal;
mod recipe;

pub(crate) use helpers::json_error;
pub(crate) use meal::{MealForm, cmd_meal_add, cmd_meal_list};
pub(crate) use recipe::{cmd_recipe_import, cmd_recipe_list, cmd_recipe_search};
