use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use super::{
    http::{ApiClient, ApiError, ApiResult},
    local::keys,
};
use crate::{
    catalog::{self, RecipeFilter},
    comments::Comment,
    recipes::{Recipe, RecipeInput, RecipePatch},
    users::PublicUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Recipes,
    Favorites,
}

/// Client-side view of the catalog plus the current user's favorites and votes.
///
/// The user is whoever the persisted session names, so logins, logouts and
/// sessions dropped on a 401 are picked up without extra wiring.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    api: ApiClient,
    /// User the cached favorites and votes belong to.
    loaded_for: Option<Uuid>,
    recipes: Vec<Recipe>,
    favorites: HashSet<Uuid>,
    user_ratings: HashMap<Uuid, i64>,
    filter: RecipeFilter,
}

impl RecipeStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            loaded_for: None,
            recipes: Vec::new(),
            favorites: HashSet::new(),
            user_ratings: HashMap::new(),
            filter: RecipeFilter::default(),
        }
    }

    /// The signed-in user according to the local store.
    pub fn user_id(&self) -> Option<Uuid> {
        match self.api.store().get::<PublicUser>(keys::USER) {
            Ok(user) => user.map(|u| u.id),
            Err(e) => {
                warn!(error = %e, "stored user unreadable");
                None
            }
        }
    }

    /// Switching users drops the previous user's favorites and votes.
    fn sync_user(&mut self) -> Option<Uuid> {
        let current = self.user_id();
        if self.loaded_for != current {
            self.favorites.clear();
            self.user_ratings.clear();
            self.loaded_for = current;
        }
        current
    }

    fn cache_is_current(&self) -> bool {
        self.loaded_for.is_some() && self.loaded_for == self.user_id()
    }

    fn require_user(&mut self) -> ApiResult<Uuid> {
        self.sync_user().ok_or(ApiError::NotLoggedIn)
    }

    // Reads: failures leave the collection empty and are passed on.

    pub async fn load_recipes(&mut self) -> ApiResult<()> {
        match self.api.recipes().list(&RecipeFilter::default()).await {
            Ok(recipes) => {
                self.recipes = recipes;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "loading recipes failed");
                self.recipes.clear();
                Err(e)
            }
        }
    }

    pub async fn load_favorites(&mut self) -> ApiResult<()> {
        let Some(user_id) = self.sync_user() else {
            self.favorites.clear();
            return Ok(());
        };
        match self.api.favorites().by_user(user_id).await {
            Ok(rows) => {
                self.favorites = rows.into_iter().map(|f| f.recipe_id).collect();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "loading favorites failed");
                self.favorites.clear();
                Err(e)
            }
        }
    }

    pub async fn load_user_ratings(&mut self) -> ApiResult<()> {
        let Some(user_id) = self.sync_user() else {
            self.user_ratings.clear();
            return Ok(());
        };
        match self.api.ratings().by_user(user_id).await {
            Ok(rows) => {
                self.user_ratings = rows.into_iter().map(|r| (r.recipe_id, r.rating)).collect();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "loading ratings failed");
                self.user_ratings.clear();
                Err(e)
            }
        }
    }

    /// Best effort resync after a failed write.
    async fn recover(&mut self, what: Collection) {
        let res = match what {
            Collection::Recipes => self.load_recipes().await,
            Collection::Favorites => self.load_favorites().await,
        };
        if let Err(e) = res {
            warn!(error = %e, ?what, "resync failed");
        }
    }

    // Views

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: Uuid) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn filter(&self) -> &RecipeFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: RecipeFilter) {
        self.filter = filter;
    }

    pub fn filtered(&self) -> Vec<&Recipe> {
        self.filter.apply(self.recipes.iter().collect())
    }

    pub fn suggested(&self, id: Uuid, limit: usize) -> Vec<&Recipe> {
        catalog::suggested(&self.recipes, id, limit)
    }

    pub fn user_recipes(&self, author_id: Uuid) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.author_id == author_id).collect()
    }

    pub fn favorite_recipes(&self) -> Vec<&Recipe> {
        if !self.cache_is_current() {
            return Vec::new();
        }
        self.recipes
            .iter()
            .filter(|r| self.favorites.contains(&r.id))
            .collect()
    }

    pub fn is_favorited(&self, id: Uuid) -> bool {
        self.cache_is_current() && self.favorites.contains(&id)
    }

    pub fn user_rating(&self, id: Uuid) -> Option<i64> {
        if !self.cache_is_current() {
            return None;
        }
        self.user_ratings.get(&id).copied()
    }

    pub fn record_view(&self, id: Uuid) -> anyhow::Result<()> {
        self.api.store().record_view(id)
    }

    pub fn recently_viewed(&self) -> Vec<&Recipe> {
        catalog::suggest::recently_viewed(&self.recipes, &self.api.store().recently_viewed())
    }

    fn replace(&mut self, recipe: Recipe) {
        match self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(slot) => *slot = recipe,
            None => self.recipes.insert(0, recipe),
        }
    }

    // Writes: the local copy changes only after the server agreed.

    pub async fn create_recipe(&mut self, input: &RecipeInput) -> ApiResult<Recipe> {
        self.require_user()?;
        match self.api.recipes().create(input).await {
            Ok(recipe) => {
                self.recipes.insert(0, recipe.clone());
                Ok(recipe)
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }

    pub async fn update_recipe(&mut self, id: Uuid, patch: &RecipePatch) -> ApiResult<Recipe> {
        self.require_user()?;
        match self.api.recipes().update(id, patch).await {
            Ok(recipe) => {
                self.replace(recipe.clone());
                Ok(recipe)
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }

    pub async fn delete_recipe(&mut self, id: Uuid) -> ApiResult<()> {
        self.require_user()?;
        match self.api.recipes().delete(id).await {
            Ok(()) => {
                self.recipes.retain(|r| r.id != id);
                self.favorites.remove(&id);
                self.user_ratings.remove(&id);
                Ok(())
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }

    pub async fn rate(&mut self, id: Uuid, score: i64) -> ApiResult<Recipe> {
        self.require_user()?;
        match self.api.ratings().rate(id, score).await {
            Ok(recipe) => {
                self.user_ratings.insert(id, score);
                self.replace(recipe.clone());
                Ok(recipe)
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }

    /// Returns whether the recipe is a favorite afterwards.
    pub async fn toggle_favorite(&mut self, id: Uuid) -> ApiResult<bool> {
        self.require_user()?;
        match self.api.favorites().toggle(id).await {
            Ok(res) => {
                if res.favorited {
                    self.favorites.insert(id);
                } else {
                    self.favorites.remove(&id);
                }
                Ok(res.favorited)
            }
            Err(e) => {
                self.recover(Collection::Favorites).await;
                Err(e)
            }
        }
    }

    pub async fn add_comment(&mut self, recipe_id: Uuid, content: &str) -> ApiResult<Comment> {
        self.require_user()?;
        match self.api.comments().create(recipe_id, content).await {
            Ok(comment) => {
                if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == recipe_id) {
                    recipe.comments.insert(0, comment.clone());
                }
                Ok(comment)
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }

    pub async fn delete_comment(&mut self, recipe_id: Uuid, comment_id: Uuid) -> ApiResult<()> {
        self.require_user()?;
        match self.api.comments().delete(comment_id).await {
            Ok(()) => {
                if let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == recipe_id) {
                    recipe.comments.retain(|c| c.id != comment_id);
                }
                Ok(())
            }
            Err(e) => {
                self.recover(Collection::Recipes).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RegisterRequest;
    use crate::client::{AuthSession, LocalStore};
    use crate::recipes::{fixtures::input, Category};
    use crate::test_support::{TestApp, PASSWORD};
    use tempfile::TempDir;

    async fn logged_in(app: &TestApp, dir: &TempDir, email: &str) -> RecipeStore {
        let session = app.register(email, "Store User").await;
        let local = LocalStore::open(dir.path()).unwrap();
        local.set(keys::TOKEN, &session.access_token).unwrap();
        local.set(keys::USER, &session.user).unwrap();
        RecipeStore::new(ApiClient::new(&app.base_url, local))
    }

    #[tokio::test]
    async fn writes_update_local_state() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let mut store = logged_in(&app, &dir, "rs@example.com").await;
        store.load_recipes().await.unwrap();
        assert!(store.recipes().is_empty());

        let first = store.create_recipe(&input("Waffles", Category::Breakfast)).await.unwrap();
        let second = store.create_recipe(&input("Nachos", Category::Snack)).await.unwrap();
        assert_eq!(store.recipes()[0].id, second.id);

        let rated = store.rate(first.id, 4).await.unwrap();
        assert_eq!(rated.rating, 4.0);
        assert_eq!(store.get(first.id).unwrap().total_ratings, 1);
        assert_eq!(store.user_rating(first.id), Some(4));

        assert!(store.toggle_favorite(first.id).await.unwrap());
        assert!(store.is_favorited(first.id));
        assert_eq!(store.favorite_recipes().len(), 1);

        let comment = store.add_comment(first.id, "crispy!").await.unwrap();
        assert_eq!(store.get(first.id).unwrap().comments[0].id, comment.id);
        store.delete_comment(first.id, comment.id).await.unwrap();
        assert!(store.get(first.id).unwrap().comments.is_empty());

        let patch = RecipePatch {
            title: Some("Belgian Waffles".into()),
            ..Default::default()
        };
        store.update_recipe(first.id, &patch).await.unwrap();
        assert_eq!(store.get(first.id).unwrap().title, "Belgian Waffles");

        store.delete_recipe(second.id).await.unwrap();
        assert!(store.get(second.id).is_none());

        // a fresh container sees the same state from the server
        let mut reloaded = RecipeStore::new(store.api.clone());
        reloaded.load_recipes().await.unwrap();
        reloaded.load_favorites().await.unwrap();
        reloaded.load_user_ratings().await.unwrap();
        assert_eq!(reloaded.recipes(), store.recipes());
        assert!(reloaded.is_favorited(first.id));
        assert_eq!(reloaded.user_rating(first.id), Some(4));
    }

    #[tokio::test]
    async fn failed_write_resyncs_from_server() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let mut store = logged_in(&app, &dir, "fw@example.com").await;
        let kept = store.create_recipe(&input("Focaccia", Category::Lunch)).await.unwrap();

        // local-only garbage that the server does not know about
        let mut ghost = kept.clone();
        ghost.id = Uuid::new_v4();
        store.recipes.push(ghost.clone());

        let err = store.rate(ghost.id, 5).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(store.recipes().len(), 1);
        assert_eq!(store.recipes()[0].id, kept.id);
    }

    #[tokio::test]
    async fn writes_need_a_user() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let local = LocalStore::open(dir.path()).unwrap();
        let mut store = RecipeStore::new(ApiClient::new(&app.base_url, local));

        let err = store
            .create_recipe(&input("Nope", Category::Snack))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotLoggedIn));
        assert!(store.toggle_favorite(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn follows_the_session_through_login_and_logout() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let api = ApiClient::new(&app.base_url, LocalStore::open(dir.path()).unwrap());
        let mut session = AuthSession::new(api.clone());
        let mut store = RecipeStore::new(api);
        assert_eq!(store.user_id(), None);

        let register = RegisterRequest {
            email: "follow@example.com".into(),
            password: PASSWORD.into(),
            name: "Follower".into(),
            avatar: None,
            bio: None,
            dietary_preferences: None,
        };
        let me = session.register(&register).await.unwrap();
        assert_eq!(store.user_id(), Some(me.id));

        let recipe = store.create_recipe(&input("Gnocchi", Category::Dinner)).await.unwrap();
        assert!(store.toggle_favorite(recipe.id).await.unwrap());
        assert!(store.is_favorited(recipe.id));

        session.logout();
        assert_eq!(store.user_id(), None);
        assert!(!store.is_favorited(recipe.id));
        assert!(matches!(
            store.toggle_favorite(recipe.id).await.unwrap_err(),
            ApiError::NotLoggedIn
        ));

        session.login("follow@example.com", PASSWORD).await.unwrap();
        store.load_favorites().await.unwrap();
        assert!(store.is_favorited(recipe.id));
    }

    #[tokio::test]
    async fn an_expired_session_logs_the_store_out() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let store = logged_in(&app, &dir, "expired@example.com").await;
        assert!(store.user_id().is_some());

        store.api.store().set(keys::TOKEN, &"not-a-jwt").unwrap();
        let err = store.api.favorites().toggle(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(store.user_id(), None);
    }

    #[tokio::test]
    async fn views_filter_and_suggest_locally() {
        let app = TestApp::spawn().await;
        let dir = TempDir::new().unwrap();
        let mut store = logged_in(&app, &dir, "v@example.com").await;
        let a = store.create_recipe(&input("Tomato Soup", Category::Dinner)).await.unwrap();
        store.create_recipe(&input("Beef Stew", Category::Dinner)).await.unwrap();
        store.create_recipe(&input("Iced Tea", Category::Drink)).await.unwrap();

        store.set_filter(RecipeFilter {
            category: Some(Category::Dinner),
            ..Default::default()
        });
        assert_eq!(store.filtered().len(), 2);

        let picks = store.suggested(a.id, 4);
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].title, "Beef Stew");
        assert_eq!(store.user_recipes(a.author_id).len(), 3);

        store.record_view(a.id).unwrap();
        store.record_view(Uuid::new_v4()).unwrap();
        let seen = store.recently_viewed();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, a.id);
    }
}
