/// Post service - handles post creation, feed assembly and deletion
use crate::clients::{CaptionGenerator, MediaStore, UploadedMedia};
use crate::db::{CommentStore, LikeStore, PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{CommentView, NewPost, Post, PostView, UserSummary};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_CAPTION: &str = "Check out this amazing moment! 📸✨";
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 20;

/// Image received from a multipart upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    likes: Arc<dyn LikeStore>,
    comments: Arc<dyn CommentStore>,
    users: Arc<dyn UserStore>,
    media: Arc<dyn MediaStore>,
    generator: Arc<dyn CaptionGenerator>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        likes: Arc<dyn LikeStore>,
        comments: Arc<dyn CommentStore>,
        users: Arc<dyn UserStore>,
        media: Arc<dyn MediaStore>,
        generator: Arc<dyn CaptionGenerator>,
    ) -> Self {
        Self {
            posts,
            likes,
            comments,
            users,
            media,
            generator,
        }
    }

    /// Create a new post
    ///
    /// Upload and caption generation run concurrently. A failed upload aborts
    /// the post; a failed caption falls back to `DEFAULT_CAPTION`.
    pub async fn create_post(
        &self,
        user_id: Uuid,
        image: Option<ImageUpload>,
        mentions: Option<&str>,
    ) -> Result<PostView> {
        let image = image
            .filter(|img| !img.bytes.is_empty())
            .ok_or_else(|| AppError::ValidationError("No image file provided".to_string()))?;

        if !image.content_type.starts_with("image/") {
            return Err(AppError::ValidationError(
                "Uploaded file must be an image".to_string(),
            ));
        }

        let author = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let file_name = Uuid::new_v4().to_string();
        let (uploaded, caption) = tokio::join!(
            self.media
                .upload(image.bytes.clone(), &file_name, &image.content_type),
            self.generator.generate(&image.bytes, &image.content_type),
        );

        let uploaded = uploaded.map_err(|err| {
            tracing::error!(%user_id, error = %err, "image upload failed");
            AppError::from(err)
        })?;

        let caption = match caption {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => DEFAULT_CAPTION.to_string(),
            Err(err) => {
                warn!(%user_id, error = %err, "caption generation failed, using default");
                DEFAULT_CAPTION.to_string()
            }
        };

        let file_id = uploaded.file_id.clone();
        let post = match self.store_post(user_id, uploaded, caption, mentions).await {
            Ok(post) => post,
            Err(err) => {
                self.discard_upload(&file_id).await;
                return Err(err);
            }
        };

        info!(post_id = %post.id, %user_id, "post created");

        Ok(PostView::new(post, UserSummary::from(&author)))
    }

    /// Public feed, newest first
    pub async fn list_posts(
        &self,
        skip: Option<i64>,
        limit: Option<i64>,
        viewer: Option<Uuid>,
    ) -> Result<Vec<PostView>> {
        let (skip, limit) = page_bounds(skip, limit)?;
        let posts = self.posts.list_posts(skip, limit).await?;
        self.assemble(posts, viewer).await
    }

    /// The caller's own posts, newest first
    pub async fn list_user_posts(&self, user_id: Uuid) -> Result<Vec<PostView>> {
        let posts = self.posts.list_posts_by_user(user_id).await?;
        self.assemble(posts, Some(user_id)).await
    }

    /// Delete a post owned by `user_id`, its stored image, likes and comments
    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        match post.image_file_id.as_deref() {
            Some(file_id) => {
                if let Err(err) = self.media.delete(file_id).await {
                    // the post still goes; the orphaned file is left for manual cleanup
                    warn!(%post_id, %file_id, error = %err, "stored image delete failed");
                }
            }
            None => info!(%post_id, "post has no stored image handle"),
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        info!(%post_id, %user_id, "post deleted");
        Ok(())
    }

    async fn store_post(
        &self,
        user_id: Uuid,
        uploaded: UploadedMedia,
        caption: String,
        mentions: Option<&str>,
    ) -> Result<Post> {
        let mention_ids = self.resolve_mentions(mentions).await?;

        Ok(self
            .posts
            .insert_post(NewPost {
                user_id,
                image_url: uploaded.url,
                image_file_id: Some(uploaded.file_id),
                caption,
                mentions: mention_ids,
            })
            .await?)
    }

    /// Remove an image whose post was never stored
    async fn discard_upload(&self, file_id: &str) {
        match self.media.delete(file_id).await {
            Ok(()) => warn!(%file_id, "post not stored, uploaded image removed"),
            Err(err) => {
                warn!(%file_id, error = %err, "post not stored, uploaded image left behind")
            }
        }
    }

    async fn resolve_mentions(&self, mentions: Option<&str>) -> Result<Vec<Uuid>> {
        let usernames = parse_mentions(mentions.unwrap_or_default());
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.users.find_by_usernames(&usernames).await?;
        let by_name: HashMap<&str, Uuid> =
            found.iter().map(|u| (u.username.as_str(), u.id)).collect();

        Ok(usernames
            .iter()
            .filter_map(|name| by_name.get(name.as_str()).copied())
            .collect())
    }

    /// Join authors, comments and (for a signed-in viewer) like state
    async fn assemble(&self, posts: Vec<Post>, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let author_ids: Vec<Uuid> = posts
            .iter()
            .map(|p| p.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<Uuid, UserSummary> = self
            .users
            .find_summaries(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut comments: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for comment in self.comments.comments_for_posts(&post_ids).await? {
            comments.entry(comment.post_id).or_default().push(comment);
        }

        let liked: Option<HashSet<Uuid>> = match viewer {
            Some(viewer_id) => Some(
                self.likes
                    .liked_post_ids(viewer_id, &post_ids)
                    .await?
                    .into_iter()
                    .collect(),
            ),
            None => None,
        };

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let author = authors.get(&post.user_id)?.clone();
                let post_id = post.id;
                let mut view = PostView::new(post, author);
                view.comments = comments.remove(&post_id).unwrap_or_default();
                view.is_liked = liked.as_ref().map(|ids| ids.contains(&post_id));
                Some(view)
            })
            .collect())
    }
}

/// Normalise `skip`/`limit` query values
pub fn page_bounds(skip: Option<i64>, limit: Option<i64>) -> Result<(i64, i64)> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if skip < 0 || limit < 0 {
        return Err(AppError::ValidationError(
            "skip and limit must be non-negative".to_string(),
        ));
    }

    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    Ok((skip, limit.min(MAX_PAGE_SIZE)))
}

/// Split a comma-separated mention list into usernames
pub fn parse_mentions(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(|name| name.trim().trim_start_matches('@').trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}
