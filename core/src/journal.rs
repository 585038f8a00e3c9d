use std::path::Path;

use anyhow::{Result, bail};
use chrono::Utc;

use crate::db::Database;
use crate::importer::{ImportReport, PageFetcher, import_from};
use crate::models::{Meal, NewMeal, Recipe, validate_recipe};
use crate::search::search_recipes;
use crate::store::{SaveStatus, Store};

/// Application state: both collections held in memory, with every mutation
/// written through to the [`Store`].
pub struct Journal {
    store: Store,
    meals: Vec<Meal>,
    recipes: Vec<Recipe>,
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    #[must_use]
    pub fn with_database(db: Database) -> Self {
        let store = Store::new(db);
        let meals = store.load::<Meal>().records;
        let recipes = store.load::<Recipe>().records;
        Self {
            store,
            meals,
            recipes,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Meals, newest first.
    #[must_use]
    pub fn meals(&self) -> Vec<&Meal> {
        let mut meals: Vec<&Meal> = self.meals.iter().collect();
        meals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        meals
    }

    /// Recipes in stored order (most recently added first).
    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    #[must_use]
    pub fn search_recipes(&self, query: &str) -> Vec<&Recipe> {
        search_recipes(query, &self.recipes)
    }

    /// Record a meal. Only invalid input is an error; a failed write is
    /// reported through the returned [`SaveStatus`].
    pub fn add_meal(&mut self, new: NewMeal) -> Result<(Meal, SaveStatus)> {
        let mut meal = Meal::create(new, 0)?;
        let now = Utc::now().timestamp_millis();
        let id = meal.id.clone();

        let status = self.store.update(&mut self.meals, move |meals| {
            meal.created_at = next_created_at(meals, now);
            meals.insert(0, meal);
        });

        let saved = self
            .meals
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Meal {id} missing after insert"))?;
        tracing::debug!(id = %saved.id, created_at = saved.created_at, "meal recorded");
        Ok((saved, status))
    }

    pub fn add_recipe(&mut self, recipe: Recipe) -> Result<SaveStatus> {
        validate_recipe(&recipe)?;
        if self.recipes.iter().any(|r| r.id == recipe.id) {
            bail!("Recipe id '{}' already exists", recipe.id);
        }
        tracing::debug!(id = %recipe.id, title = %recipe.title, "recipe saved");
        Ok(self
            .store
            .update(&mut self.recipes, move |recipes| recipes.insert(0, recipe)))
    }

    /// Import a recipe page and keep the resulting record, degraded or not.
    pub async fn import_recipe<F: PageFetcher>(
        &mut self,
        fetcher: &F,
        url: &str,
    ) -> Result<(ImportReport, SaveStatus)> {
        let url = url.trim();
        if url.is_empty() {
            bail!("Recipe URL must not be empty");
        }
        let report = import_from(fetcher, url).await;
        let status = self.add_recipe(report.recipe.clone())?;
        Ok((report, status))
    }
}

/// Creation time for a new meal: now, but strictly after every existing meal
/// so that newest-first ordering matches insertion order.
fn next_created_at(meals: &[Meal], now: i64) -> i64 {
    meals
        .iter()
        .map(|m| m.created_at)
        .max()
        .map_or(now, |newest| now.max(newest + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::ImportOutcome;
    use crate::models::MealType;
    use crate::store::LoadStatus;

    struct Offline;

    impl PageFetcher for Offline {
        async fn fetch_page(&self, _url: &str) -> Result<String> {
            bail!("network unreachable")
        }
    }

    struct Page(&'static str);

    impl PageFetcher for Page {
        async fn fetch_page(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn lunch(title: &str) -> NewMeal {
        NewMeal {
            meal_type: MealType::Lunch,
            title: title.to_string(),
            tags: "家常, 快手".to_string(),
            ..NewMeal::default()
        }
    }

    #[test]
    fn test_empty_journal() {
        let journal = Journal::open_in_memory().unwrap();
        assert!(journal.meals().is_empty());
        assert!(journal.recipes().is_empty());
    }

    #[test]
    fn test_add_meal_persists() {
        let mut journal = Journal::open_in_memory().unwrap();
        let (meal, status) = journal.add_meal(lunch("牛肉面")).unwrap();
        assert!(status.is_saved());
        assert_eq!(meal.title, "牛肉面");
        assert_eq!(meal.tags, vec!["家常", "快手"]);
        assert!(meal.created_at > 0);

        let stored = journal.store().load::<Meal>();
        assert_eq!(stored.status, LoadStatus::Found);
        assert_eq!(stored.records, vec![meal]);
    }

    #[test]
    fn test_add_meal_rejects_blank_title() {
        let mut journal = Journal::open_in_memory().unwrap();
        assert!(journal.add_meal(lunch("  ")).is_err());
        assert!(journal.meals().is_empty());
        assert_eq!(journal.store().load::<Meal>().status, LoadStatus::Missing);
    }

    #[test]
    fn test_meals_newest_first_with_strictly_increasing_times() {
        let mut journal = Journal::open_in_memory().unwrap();
        for title in ["一", "二", "三"] {
            journal.add_meal(lunch(title)).unwrap();
        }
        let meals = journal.meals();
        let titles: Vec<&str> = meals.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["三", "二", "一"]);
        assert!(meals[0].created_at > meals[1].created_at);
        assert!(meals[1].created_at > meals[2].created_at);
    }

    #[test]
    fn test_next_created_at() {
        assert_eq!(next_created_at(&[], 100), 100);
        let mut meal = Meal::create(lunch("x"), 500).unwrap();
        assert_eq!(next_created_at(std::slice::from_ref(&meal), 100), 501);
        meal.created_at = 50;
        assert_eq!(next_created_at(&[meal], 100), 100);
    }

    #[test]
    fn test_reopen_reloads_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carol.db");
        {
            let mut journal = Journal::open(&path).unwrap();
            journal.add_meal(lunch("粥")).unwrap();
            journal
                .add_recipe(Recipe::new(
                    "红烧肉".to_string(),
                    String::new(),
                    "https://example.com/r".to_string(),
                ))
                .unwrap();
        }
        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.meals().len(), 1);
        assert_eq!(journal.recipes()[0].title, "红烧肉");
    }

    #[test]
    fn test_failed_write_keeps_session_state() {
        let db = Database::open_in_memory().unwrap().with_quota(10);
        let mut journal = Journal::with_database(db);
        let (_, status) = journal.add_meal(lunch("粥")).unwrap();
        assert!(matches!(status, SaveStatus::Failed { .. }));
        assert_eq!(journal.meals().len(), 1);
        assert!(journal.store().load::<Meal>().records.is_empty());
    }

    #[test]
    fn test_corrupt_collection_starts_empty_and_is_replaced() {
        let db = Database::open_in_memory().unwrap();
        db.set("meals", "[[[").unwrap();
        let mut journal = Journal::with_database(db);
        assert!(journal.meals().is_empty());

        journal.add_meal(lunch("粥")).unwrap();
        let stored = journal.store().load::<Meal>();
        assert_eq!(stored.status, LoadStatus::Found);
        assert_eq!(stored.records.len(), 1);
    }

    #[tokio::test]
    async fn test_import_recipe_offline_keeps_degraded_record() {
        let mut journal = Journal::open_in_memory().unwrap();
        let url = "https://example.com/recipe";
        let (report, status) = journal.import_recipe(&Offline, url).await.unwrap();
        assert!(status.is_saved());
        assert!(matches!(report.outcome, ImportOutcome::Failed { .. }));
        assert_eq!(journal.recipes().len(), 1);
        let recipe = &journal.recipes()[0];
        assert_eq!(recipe.title, url);
        assert_eq!(recipe.cover, "");
        assert_eq!(recipe.source_url, url);
        assert!(recipe.tags.is_empty());
    }

    #[tokio::test]
    async fn test_import_recipe_prepends_and_does_not_dedupe() {
        let mut journal = Journal::open_in_memory().unwrap();
        let page = Page(r#"<meta property="og:title" content="番茄炒蛋">"#);
        journal
            .import_recipe(&page, "https://example.com/a")
            .await
            .unwrap();
        journal
            .import_recipe(&page, " https://example.com/a ")
            .await
            .unwrap();
        journal
            .import_recipe(&Offline, "https://example.com/b")
            .await
            .unwrap();

        let recipes = journal.recipes();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].title, "https://example.com/b");
        assert_eq!(recipes[1].source_url, "https://example.com/a");
        assert_ne!(recipes[1].id, recipes[2].id);
        assert_eq!(journal.search_recipes("番茄").len(), 2);
    }

    #[tokio::test]
    async fn test_import_recipe_rejects_blank_url() {
        let mut journal = Journal::open_in_memory().unwrap();
        assert!(journal.import_recipe(&Offline, "  ").await.is_err());
        assert!(journal.recipes().is_empty());
    }

    #[test]
    fn test_meal_with_failed_write_stays_in_session() {
        let db = Database::open_in_memory().unwrap().with_quota(400);
        let mut journal = Journal::with_database(db);

        let (_, first) = journal.add_meal(lunch("早饭")).unwrap();
        assert!(first.is_saved());

        let with_photo = NewMeal {
            photo_data_url: Some(format!("data:image/png;base64,{}", "A".repeat(1000))),
            ..lunch("拍照的午饭")
        };
        let (_, second) = journal.add_meal(with_photo).unwrap();
        assert!(!second.is_saved());
        assert_eq!(journal.meals().len(), 2);

        journal.add_meal(lunch("粥")).unwrap();
        let titles: Vec<&str> = journal.meals().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["粥", "拍照的午饭", "早饭"]);
    }

    #[test]
    fn test_add_recipe_rejects_existing_id() {
        let mut journal = Journal::open_in_memory().unwrap();
        let first = Recipe::new(
            "番茄炒蛋".to_string(),
            String::new(),
            "https://example.com/a".to_string(),
        );
        let other = Recipe::new(
            "红烧肉".to_string(),
            String::new(),
            "https://example.com/b".to_string(),
        );
        assert!(journal.add_recipe(other).unwrap().is_saved());
        assert!(journal.add_recipe(first.clone()).unwrap().is_saved());

        let err = journal.add_recipe(first).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(journal.recipes().len(), 2);

        let stored = journal.store().load::<Recipe>();
        assert_eq!(stored.status, LoadStatus::Found);
        assert_eq!(stored.records.len(), 2);
    }
}
