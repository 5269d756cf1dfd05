//! Post edits and single-post fetches

use tracing::debug;

use super::validation::PostForm;
use crate::api::Api;
use crate::error::Result;
use crate::store::{Action, Store};
use crate::types::{Genre, Post, PostPatch};

#[derive(Clone)]
pub struct PostService {
    api: Api,
    store: Store,
}

impl PostService {
    pub fn new(api: Api, store: Store) -> Self {
        Self { api, store }
    }

    /// Upload the edit and merge the stored post into the feed
    pub async fn update_post(&self, post_id: &str, form: &PostForm) -> Result<Post> {
        form.validate()?;
        let post = self.api.update_post(post_id, form.to_parts()).await?;
        self.store.dispatch(Action::UpdatePost {
            post_id: post_id.to_string(),
            patch: PostPatch::from(post.clone()),
        });
        Ok(post)
    }

    /// Genres to pick `PostForm::genre_id` from
    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        Ok(self.api.list_genres().await?)
    }

    /// Fetch one post and upsert it into the feed
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let post = self.api.get_post(post_id).await?;
        debug!(post_id, "post fetched");
        self.store.dispatch(Action::AddPost(post.clone()));
        Ok(post)
    }
}
