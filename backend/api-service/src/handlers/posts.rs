/// Post handlers - HTTP endpoints for posts, comments and likes
use crate::error::{AppError, Result};
use crate::handlers::parse_id;
use crate::middleware::{UserId, Viewer};
use crate::services::{CommentService, ImageUpload, LikeService, PostService};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;

/// Largest accepted image upload, in bytes
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

impl Default for UploadLimit {
    fn default() -> Self {
        Self(10 * 1024 * 1024)
    }
}

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub post: Option<String>,
}

/// Absent or blank ids are "missing"; anything unparsable cannot name a post
fn optional_post_id(raw: Option<&str>) -> Result<Option<uuid::Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => parse_id(id, "Post").map(Some),
        None => Ok(None),
    }
}

/// GET /posts?skip=&limit=
pub async fn list_posts(
    service: web::Data<PostService>,
    viewer: Viewer,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let posts = service.list_posts(query.skip, query.limit, viewer.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Posts fetched successfully",
        "posts": posts,
    })))
}

/// POST /posts (multipart: `image`, `mentions`)
pub async fn create_post(
    service: web::Data<PostService>,
    limit: Option<web::Data<UploadLimit>>,
    user_id: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let max_bytes = limit.map(|l| l.0).unwrap_or_else(|| UploadLimit::default().0);

    let mut image: Option<ImageUpload> = None;
    let mut mentions: Option<String> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::ValidationError(format!("Multipart error: {}", e)))?;

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::ValidationError(format!("Upload read error: {}", e)))?;
                    if bytes.len() + data.len() > max_bytes {
                        return Err(AppError::ValidationError(format!(
                            "Image exceeds the {} byte limit",
                            max_bytes
                        )));
                    }
                    bytes.extend_from_slice(&data);
                }

                image = Some(ImageUpload {
                    bytes,
                    content_type,
                });
            }
            "mentions" => {
                let mut raw = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::ValidationError(format!("Field read error: {}", e)))?;
                    raw.extend_from_slice(&data);
                }
                mentions = Some(String::from_utf8_lossy(&raw).into_owned());
            }
            _ => {
                // Drain unknown fields
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::ValidationError(format!("Field read error: {}", e)))?;
                }
            }
        }
    }

    let post = service
        .create_post(user_id.0, image, mentions.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Post created successfully",
        "post": post,
    })))
}

/// GET /posts/user/profile
pub async fn list_my_posts(
    service: web::Data<PostService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let posts = service.list_user_posts(user_id.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User posts fetched successfully",
        "posts": posts,
    })))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&path, "Post")?;
    service.delete_post(user_id.0, post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully",
        "postId": post_id,
    })))
}

/// POST /posts/comment
pub async fn create_comment(
    service: web::Data<CommentService>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let post_id = optional_post_id(req.post.as_deref())?;
    let comment = service
        .create_comment(user_id.0, post_id, req.text.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment created successfully",
        "comment": comment,
    })))
}

/// POST /posts/like
///
/// 201 when the call created a like, 200 when it removed one.
pub async fn toggle_like(
    service: web::Data<LikeService>,
    user_id: UserId,
    req: web::Json<ToggleLikeRequest>,
) -> Result<HttpResponse> {
    let post_id = optional_post_id(req.post.as_deref())?;
    let outcome = service.toggle_like(user_id.0, post_id).await?;

    let (mut response, message) = if outcome.is_liked {
        (HttpResponse::Created(), "Post liked successfully")
    } else {
        (HttpResponse::Ok(), "Like removed successfully")
    };

    Ok(response.json(serde_json::json!({
        "message": message,
        "isLiked": outcome.is_liked,
        "likeCount": outcome.like_count,
    })))
}
