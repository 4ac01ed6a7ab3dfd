//! VK wall publish adapter.
//!
//! Implements the group wall photo protocol (`photos.getWallUploadServer` ->
//! raw multipart upload -> `photos.saveWallPhoto`) followed by `wall.post`.
//! Photos are uploaded strictly one after another with a short pause between
//! them; a photo that fails anywhere in its three steps is dropped and the
//! post goes out with the attachments that did make it.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::outcome::PublishOutcome;
use crate::textutil::truncate_chars;

const VK_API_BASE: &str = "https://api.vk.com/method";
const VK_API_VERSION: &str = "5.131";
/// VK rejects wall posts longer than this.
pub const WALL_TEXT_LIMIT: usize = 4096;
const CALL_TIMEOUT: Duration = Duration::from_secs(15);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between successive photo uploads, per VK rate limits.
const UPLOAD_PAUSE: Duration = Duration::from_millis(500);

/// "Access to adding post denied": the token cannot post as the group.
const ERR_POST_ACCESS_DENIED: i64 = 214;
/// "Group authorization failed": a group token was supplied where a user
/// token with admin rights is required.
const ERR_GROUP_AUTH_FAILED: i64 = 27;

#[derive(Debug, Deserialize)]
struct VkEnvelope<T> {
    response: Option<T>,
    error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
struct VkApiError {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug)]
enum VkCallError {
    Api(VkApiError),
    Transport(anyhow::Error),
}

impl std::fmt::Display for VkCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VkCallError::Api(e) => write!(f, "VK API error {}: {}", e.error_code, e.error_msg),
            VkCallError::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for VkCallError {}

impl VkCallError {
    fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            VkCallError::Api(e)
                if e.error_code == ERR_POST_ACCESS_DENIED || e.error_code == ERR_GROUP_AUTH_FAILED
        )
    }
}

#[derive(Debug, Deserialize)]
struct WallUploadServer {
    upload_url: String,
}

/// Raw upload server reply; `photo` is an opaque JSON string echoed back to
/// `photos.saveWallPhoto`.
#[derive(Debug, Deserialize)]
struct WallUpload {
    photo: String,
    server: i64,
    hash: String,
}

#[derive(Debug, Deserialize)]
struct SavedPhoto {
    id: i64,
    owner_id: i64,
}

#[derive(Debug, Deserialize)]
struct ResolvedName {
    #[serde(rename = "type")]
    kind: String,
    object_id: i64,
}

#[derive(Debug, Deserialize)]
struct GroupInfo {
    #[serde(default)]
    is_admin: i64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PostedWall {
    post_id: i64,
}

pub struct WallPublisher {
    http: reqwest::Client,
    user_token: Option<String>,
    group_id: Option<i64>,
    screen_name: Option<String>,
}

impl WallPublisher {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            user_token: config.vk_user_token.clone(),
            group_id: config.vk_group_id,
            screen_name: config.vk_group_screen_name.clone(),
        }
    }

    /// Publish text plus uploaded photo attachments to the group wall.
    pub async fn publish(&self, bot: &Bot, text: &str, photos: &[FileId]) -> PublishOutcome {
        let Some(token) = self.user_token.as_deref() else {
            warn!("VK user token is not configured, skipping wall publication");
            return PublishOutcome::SoftFailure("VK не настроен".to_string());
        };

        let Some(group_id) = self.resolve_group_id(token).await else {
            error!("neither VK_GROUP_ID nor VK_GROUP_SCREEN_NAME resolves to a group");
            return PublishOutcome::SoftFailure("группа VK не настроена".to_string());
        };

        // The remote permission error after uploading every photo is expensive
        // and poorly diagnosable, so the rights check comes first.
        if !self.actor_can_post(token, group_id).await {
            return PublishOutcome::SoftFailure("нет прав на публикацию в группе VK".to_string());
        }

        let attachments = upload_sequentially(photos, |file_id| {
            self.upload_wall_photo(bot, token, group_id, file_id)
        })
        .await;

        match self.post_to_wall(token, group_id, text, &attachments).await {
            Ok(()) => {
                info!(attachments = attachments.len(), "posted to the VK wall");
                PublishOutcome::Success
            }
            Err(e) if e.is_permission_denied() => PublishOutcome::SoftFailure(e.to_string()),
            Err(e) => {
                error!(error = %e, "failed to post to the VK wall");
                PublishOutcome::Exception(e.to_string())
            }
        }
    }

    /// Configured numeric id, or the screen name resolved through the API.
    async fn resolve_group_id(&self, token: &str) -> Option<i64> {
        if let Some(id) = self.group_id {
            return Some(id.abs());
        }
        let screen_name = self.screen_name.as_deref()?;
        let resolved: Result<ResolvedName, _> = self
            .call_vk(
                "utils.resolveScreenName",
                vec![("screen_name", screen_name.to_string())],
                token,
            )
            .await;
        match resolved {
            Ok(resolved) if resolved.kind == "group" => Some(resolved.object_id),
            Ok(resolved) => {
                warn!(screen_name, kind = %resolved.kind, "screen name does not resolve to a group");
                None
            }
            Err(e) => {
                error!(screen_name, error = %e, "failed to resolve the VK group by screen name");
                None
            }
        }
    }

    /// The token must belong to an administrator of the group.
    async fn actor_can_post(&self, token: &str, group_id: i64) -> bool {
        let groups: Result<Vec<GroupInfo>, _> = self
            .call_vk(
                "groups.getById",
                vec![
                    ("group_id", group_id.to_string()),
                    ("fields", "is_admin".to_string()),
                ],
                token,
            )
            .await;
        match groups {
            Ok(groups) => match groups.first() {
                Some(group) if group.is_admin == 1 => true,
                Some(_) => {
                    warn!(
                        group_id,
                        "the VK token does not carry admin rights on the group"
                    );
                    false
                }
                None => {
                    warn!(group_id, "groups.getById returned no groups");
                    false
                }
            },
            Err(e) => {
                error!(group_id, error = %e, "failed to check VK posting permissions");
                false
            }
        }
    }

    /// Three-step upload of one photo, yielding a `photo{owner}_{id}`
    /// attachment identifier.
    async fn upload_wall_photo(
        &self,
        bot: &Bot,
        token: &str,
        group_id: i64,
        file_id: FileId,
    ) -> Result<String> {
        let server: WallUploadServer = self
            .call_vk(
                "photos.getWallUploadServer",
                vec![("group_id", group_id.to_string())],
                token,
            )
            .await?;

        let bytes = self.fetch_telegram_file(bot, file_id).await?;
        let form = Form::new().part("photo", Part::bytes(bytes).file_name("photo.jpg"));
        let uploaded: WallUpload = self
            .http
            .post(&server.upload_url)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .context("photo upload to the VK server failed")?
            .json()
            .await
            .context("the VK upload server returned malformed JSON")?;

        let saved: Vec<SavedPhoto> = self
            .call_vk(
                "photos.saveWallPhoto",
                vec![
                    ("group_id", group_id.to_string()),
                    ("photo", uploaded.photo),
                    ("server", uploaded.server.to_string()),
                    ("hash", uploaded.hash),
                ],
                token,
            )
            .await?;

        let photo = saved
            .first()
            .context("photos.saveWallPhoto returned an empty list")?;
        Ok(attachment_id(photo.owner_id, photo.id))
    }

    /// Photo bytes come from Telegram's file-serving endpoint.
    async fn fetch_telegram_file(&self, bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
        let file = bot
            .get_file(file_id)
            .await
            .context("failed to look up the Telegram file")?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            bot.token(),
            file.path
        );
        let response = self
            .http
            .get(&url)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .context("failed to download the photo from Telegram")?;
        Ok(response
            .bytes()
            .await
            .context("failed to read the photo body")?
            .to_vec())
    }

    async fn post_to_wall(
        &self,
        token: &str,
        group_id: i64,
        text: &str,
        attachments: &[String],
    ) -> Result<(), VkCallError> {
        let _: PostedWall = self
            .call_vk(
                "wall.post",
                vec![
                    ("owner_id", (-group_id).to_string()),
                    ("from_group", "1".to_string()),
                    ("message", truncate_chars(text, WALL_TEXT_LIMIT)),
                    ("attachments", attachments.join(",")),
                ],
                token,
            )
            .await?;
        Ok(())
    }

    async fn call_vk<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        mut params: Vec<(&str, String)>,
        token: &str,
    ) -> Result<T, VkCallError> {
        params.push(("access_token", token.to_string()));
        params.push(("v", VK_API_VERSION.to_string()));

        let envelope: VkEnvelope<T> = self
            .http
            .post(format!("{VK_API_BASE}/{method}"))
            .form(&params)
            .timeout(CALL_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("VK request {method} failed"))
            .map_err(VkCallError::Transport)?
            .json()
            .await
            .with_context(|| format!("VK response for {method} was not valid JSON"))
            .map_err(VkCallError::Transport)?;

        if let Some(api_error) = envelope.error {
            log_api_error(method, &api_error);
            return Err(VkCallError::Api(api_error));
        }
        envelope.response.ok_or_else(|| {
            VkCallError::Transport(anyhow::anyhow!(
                "VK response for {method} carried no payload"
            ))
        })
    }
}

fn log_api_error(method: &str, error: &VkApiError) {
    match error.error_code {
        ERR_POST_ACCESS_DENIED => error!(
            method,
            code = error.error_code,
            msg = %error.error_msg,
            "VK denied posting as the group; the access token must belong to a group administrator, not to the group itself"
        ),
        ERR_GROUP_AUTH_FAILED => error!(
            method,
            code = error.error_code,
            msg = %error.error_msg,
            "VK rejected a group token; wall posting requires a user token with admin rights"
        ),
        _ => error!(
            method,
            code = error.error_code,
            msg = %error.error_msg,
            "VK API call failed"
        ),
    }
}

/// Attachment identifier referencing an already-uploaded wall photo.
pub fn attachment_id(owner_id: i64, media_id: i64) -> String {
    format!("photo{owner_id}_{media_id}")
}

/// Upload each photo in input order, one at a time, pausing between uploads.
/// A failed upload drops that photo and continues with the rest.
pub async fn upload_sequentially<F, Fut>(photos: &[FileId], mut upload: F) -> Vec<String>
where
    F: FnMut(FileId) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut attachments = Vec::new();
    for (index, file_id) in photos.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(UPLOAD_PAUSE).await;
        }
        match upload(file_id.clone()).await {
            Ok(attachment) => {
                info!(%attachment, "uploaded photo to the VK wall");
                attachments.push(attachment);
            }
            Err(e) => {
                warn!(index, error = %e, "dropping a photo that failed to upload");
            }
        }
    }
    attachments
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    #[test]
    fn attachment_id_matches_the_wire_format() {
        assert_eq!(attachment_id(-987, 42), "photo-987_42");
    }

    #[tokio::test(start_paused = true)]
    async fn uploads_run_in_input_order_and_isolate_failures() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let photos = vec![
            FileId("p1".to_string()),
            FileId("p2".to_string()),
            FileId("p3".to_string()),
        ];

        let attachments = upload_sequentially(&photos, |file_id| {
            let order = Arc::clone(&order);
            async move {
                order.lock().unwrap().push(file_id.0.clone());
                if file_id.0 == "p2" {
                    Err(anyhow!("malformed upload response"))
                } else {
                    Ok(format!("photo-1_{}", file_id.0))
                }
            }
        })
        .await;

        assert_eq!(*order.lock().unwrap(), vec!["p1", "p2", "p3"]);
        assert_eq!(attachments, vec!["photo-1_p1", "photo-1_p3"]);
    }
}
