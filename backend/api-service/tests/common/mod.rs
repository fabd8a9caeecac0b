//! Shared fixtures for api-service integration tests
//!
//! `InMemoryStore` implements every store trait over one shared state so the
//! services can be exercised without PostgreSQL. Deleting a post cascades to
//! its likes and comments, matching the foreign keys in `migrations/`.
#![allow(dead_code)]

use api_service::clients::{
    CaptionGenerator, GeneratorError, MediaError, MediaStore, UploadedMedia,
};
use api_service::db::{
    CommentStore, ConversationStore, DbResult, LikeStore, PostStore, UserStore,
};
use api_service::models::{
    CommentView, Conversation, ConversationSummary, Like, Message, NewPost, NewUser, Post, User,
    UserSummary,
};
use api_service::services::{
    AuthService, ChatService, CommentService, ConversationService, LikeService, PostService,
    UserService,
};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

static JWT_INIT: Once = Once::new();

/// Install the RSA test keys once per test binary
pub fn init_jwt() {
    JWT_INIT.call_once(|| {
        crypto_core::jwt::initialize_jwt_keys(
            include_str!("../../../libs/crypto-core/testdata/test_private_key.pem"),
            include_str!("../../../libs/crypto-core/testdata/test_public_key.pem"),
        )
        .expect("test keys should load");
    });
}

pub fn token_for(user: &User) -> String {
    init_jwt();
    crypto_core::jwt::generate_access_token(user.id, &user.email, &user.username)
        .expect("token should be issued")
}

// =====================================================================
// In-memory stores
// =====================================================================

#[derive(Clone)]
struct StoredComment {
    id: Uuid,
    user_id: Uuid,
    post_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    comments: Vec<StoredComment>,
    conversations: Vec<Conversation>,
}

/// Postgres-style foreign key error for writes naming a missing post
#[derive(Debug)]
struct ForeignKeyViolation;

impl std::fmt::Display for ForeignKeyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("insert or update violates foreign key constraint")
    }
}

impl std::error::Error for ForeignKeyViolation {}

impl sqlx::error::DatabaseError for ForeignKeyViolation {
    fn message(&self) -> &str {
        "insert or update violates foreign key constraint"
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::ForeignKeyViolation
    }
}

fn foreign_key_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(ForeignKeyViolation))
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    fail_counter_updates: Arc<AtomicBool>,
    fail_post_inserts: Arc<AtomicBool>,
    hide_existing_likes: Arc<AtomicBool>,
    vanish_after_lookup: Arc<Mutex<Option<Uuid>>>,
    counter_updates: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `adjust_like_count` fail with a storage error
    pub fn fail_counter_updates(&self, fail: bool) {
        self.fail_counter_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_post_inserts(&self, fail: bool) {
        self.fail_post_inserts.store(fail, Ordering::SeqCst);
    }

    /// The next `find_post` for `post_id` still returns it, then the post is
    /// deleted, as if its owner removed it concurrently.
    pub fn vanish_after_lookup(&self, post_id: Uuid) {
        *self.vanish_after_lookup.lock().unwrap() = Some(post_id);
    }

    /// `find_like` reports nothing even when a row exists, as if another
    /// request inserted it between the check and the write.
    pub fn hide_existing_likes(&self, hide: bool) {
        self.hide_existing_likes.store(hide, Ordering::SeqCst);
    }

    pub fn counter_updates(&self) -> usize {
        self.counter_updates.load(Ordering::SeqCst)
    }

    pub fn seed_user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: String::new(),
            image: None,
            bio: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_post(&self, user_id: Uuid) -> Post {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            user_id,
            image_url: "https://media.example.com/seed.jpg".to_string(),
            image_file_id: Some(format!("file-{}", Uuid::new_v4())),
            caption: "seeded".to_string(),
            like_count: 0,
            mentions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().posts.push(post.clone());
        post
    }

    /// Overwrite the cached counter, e.g. to simulate drift
    pub fn set_like_count(&self, post_id: Uuid, count: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
            post.like_count = count;
        }
    }

    pub fn post(&self, post_id: Uuid) -> Option<Post> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    pub fn like_rows(&self, post_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .likes
            .iter()
            .filter(|l| l.post_id == post_id)
            .count()
    }

    pub fn insert_raw_like(&self, user_id: Uuid, post_id: Uuid) {
        self.state.lock().unwrap().likes.push(Like {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            created_at: Utc::now(),
        });
    }

    pub fn comment_rows(&self, post_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .count()
    }

    pub fn conversation(&self, conversation_id: Uuid) -> Option<Conversation> {
        self.state
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.state.lock().unwrap().conversations.len()
    }
}

fn summary(user: &User) -> UserSummary {
    UserSummary::from(user)
}

#[async_trait::async_trait]
impl PostStore for InMemoryStore {
    async fn insert_post(&self, post: NewPost) -> DbResult<Post> {
        if self.fail_post_inserts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            user_id: post.user_id,
            image_url: post.image_url,
            image_file_id: post.image_file_id,
            caption: post.caption,
            like_count: 0,
            mentions: post.mentions,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<Post>> {
        let found = self.post(post_id);

        let vanish = {
            let mut pending = self.vanish_after_lookup.lock().unwrap();
            if *pending == Some(post_id) {
                pending.take()
            } else {
                None
            }
        };
        if vanish.is_some() {
            self.delete_post(post_id).await?;
        }

        Ok(found)
    }

    async fn list_posts(&self, skip: i64, limit: i64) -> DbResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_posts_by_user(&self, user_id: Uuid) -> DbResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> DbResult<Option<i64>> {
        if self.fail_counter_updates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.counter_updates.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .map(|post| {
                post.like_count = (post.like_count + delta).max(0);
                post.like_count
            }))
    }

    async fn delete_post(&self, post_id: Uuid) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != post_id);
        if state.posts.len() == before {
            return Ok(false);
        }
        state.likes.retain(|l| l.post_id != post_id);
        state.comments.retain(|c| c.post_id != post_id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl LikeStore for InMemoryStore {
    async fn find_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<Option<Like>> {
        if self.hide_existing_likes.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .cloned())
    }

    async fn insert_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(foreign_key_violation());
        }
        if state
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Ok(false);
        }
        state.likes.push(Like {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(state.likes.len() != before)
    }

    async fn liked_post_ids(&self, user_id: Uuid, post_ids: &[Uuid]) -> DbResult<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .likes
            .iter()
            .filter(|l| l.user_id == user_id && post_ids.contains(&l.post_id))
            .map(|l| l.post_id)
            .collect())
    }
}

#[async_trait::async_trait]
impl CommentStore for InMemoryStore {
    async fn insert_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> DbResult<CommentView> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(foreign_key_violation());
        }
        let username = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .ok_or(sqlx::Error::RowNotFound)?;

        let comment = StoredComment {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());

        Ok(CommentView {
            id: comment.id,
            username,
            post_id,
            text: comment.text,
            created_at: comment.created_at,
        })
    }

    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> DbResult<Vec<CommentView>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .iter()
            .rev()
            .filter(|c| post_ids.contains(&c.post_id))
            .map(|c| CommentView {
                id: c.id,
                username: state
                    .users
                    .iter()
                    .find(|u| u.id == c.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                post_id: c.post_id,
                text: c.text.clone(),
                created_at: c.created_at,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryStore {
    async fn list_conversations(&self, user_id: Uuid) -> DbResult<Vec<ConversationSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .map(ConversationSummary::from)
            .collect())
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> DbResult<Option<Conversation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id && c.user_id == user_id)
            .cloned())
    }

    async fn insert_conversation(&self, user_id: Uuid, title: &str) -> DbResult<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .conversations
            .push(conversation.clone());
        Ok(conversation)
    }

    async fn push_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message: &Message,
    ) -> DbResult<Option<Conversation>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.user_id == user_id)
            .map(|c| {
                c.messages.push(message.clone());
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn update_title(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        title: &str,
    ) -> DbResult<Option<Conversation>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.user_id == user_id)
            .map(|c| {
                c.title = title.to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> DbResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.conversations.len();
        state
            .conversations
            .retain(|c| !(c.id == conversation_id && c.user_id == user_id));
        Ok(state.conversations.len() != before)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            image: None,
            bio: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> DbResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(identifier) || u.username == identifier)
            .cloned())
    }

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> DbResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .any(|u| u.username == username || u.email.eq_ignore_ascii_case(email)))
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> DbResult<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| usernames.contains(&u.username))
            .map(summary)
            .collect())
    }

    async fn find_summaries(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| user_ids.contains(&u.id))
            .map(summary)
            .collect())
    }

    async fn search_users(&self, term: &str, limit: i64) -> DbResult<Vec<UserSummary>> {
        let needle = term.to_lowercase();
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .take(limit as usize)
            .map(summary)
            .collect())
    }
}

// =====================================================================
// Outbound collaborators
// =====================================================================

/// Generator that replays scripted outcomes, then repeats its default reply
pub struct FakeGenerator {
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    default_reply: String,
    calls: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GeneratorError) -> Self {
        let generator = Self::replying("unused");
        generator.push(Err(err));
        generator
    }

    pub fn push(&self, outcome: Result<String, GeneratorError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Content types of every request received
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CaptionGenerator for FakeGenerator {
    async fn generate(&self, _bytes: &[u8], content_type: &str) -> Result<String, GeneratorError> {
        self.calls.lock().unwrap().push(content_type.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_reply.clone()))
    }
}

#[derive(Default)]
pub struct FakeMediaStore {
    fail_upload: AtomicBool,
    fail_delete: AtomicBool,
    uploads: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl FakeMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        _content_type: &str,
    ) -> Result<UploadedMedia, MediaError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("storage offline".to_string()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedMedia {
            url: format!("https://media.example.com/{}", file_name),
            file_id: format!("file-{}", n),
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), MediaError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(MediaError::Delete("storage offline".to_string()));
        }
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

// =====================================================================
// Wiring
// =====================================================================

/// Every service wired against one in-memory store
pub struct TestContext {
    pub store: InMemoryStore,
    pub generator: Arc<FakeGenerator>,
    pub media: Arc<FakeMediaStore>,
    pub auth: AuthService,
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub conversations: ConversationService,
    pub chat: ChatService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_generator(FakeGenerator::replying("A lovely generated reply"))
    }

    pub fn with_generator(generator: FakeGenerator) -> Self {
        let store = InMemoryStore::new();
        let generator = Arc::new(generator);
        let media = Arc::new(FakeMediaStore::new());

        let shared = Arc::new(store.clone());
        let conversations = ConversationService::new(shared.clone());

        Self {
            auth: AuthService::new(shared.clone()),
            users: UserService::new(shared.clone()),
            posts: PostService::new(
                shared.clone(),
                shared.clone(),
                shared.clone(),
                shared.clone(),
                media.clone(),
                generator.clone(),
            ),
            comments: CommentService::new(shared.clone(), shared.clone()),
            likes: LikeService::new(shared.clone(), shared),
            chat: ChatService::new(conversations.clone(), generator.clone()),
            conversations,
            store,
            generator,
            media,
        }
    }
}
