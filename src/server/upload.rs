use super::error::ApiError;
use super::session::AdminSession;
use super::state::ServerState;
use crate::catalog::new_item_id;
use crate::server_store::ServerStore;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

/// Keeps a client-supplied folder name from escaping the uploads dir.
/// Anything that is not a plain path-less name degrades to "uploads".
fn sanitize_folder(folder: &str) -> String {
    let clean: String = folder
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if clean.is_empty() {
        "uploads".to_string()
    } else {
        clean
    }
}

/// Strips path components and keeps a conservative character set, with a
/// random prefix so repeated uploads of the same name never collide.
fn stored_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>();
    let base = if base.is_empty() {
        "file".to_string()
    } else {
        base
    };
    let prefix: String = new_item_id().chars().take(8).collect();
    format!("{}_{}", prefix, base)
}

pub async fn upload_file(
    _admin: AdminSession,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut folder = "uploads".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Malformed upload: {}", err)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("file").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(format!("Malformed upload: {}", err)))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("folder") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(format!("Malformed upload: {}", err)))?;
                folder = sanitize_folder(&value);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty file".to_string()));
    }

    let kind = infer::get(&bytes)
        .map(|k| k.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let stored_name = stored_file_name(&filename);
    let target_dir = state.uploads_dir.join(&folder);
    tokio::fs::create_dir_all(&target_dir)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    tokio::fs::write(target_dir.join(&stored_name), &bytes)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;

    let url = format!("/uploads/{}/{}", folder, stored_name);
    state
        .server_store
        .add_uploaded_file(&stored_name, &folder, &url)?;

    info!(
        "Stored upload {} ({} bytes, {}) in {}",
        stored_name,
        bytes.len(),
        kind,
        folder
    );
    Ok(Json(UploadResponse { success: true, url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names_cannot_escape_the_uploads_dir() {
        assert_eq!(sanitize_folder("images"), "images");
        assert_eq!(sanitize_folder("../../etc"), "etc");
        assert_eq!(sanitize_folder("a/b"), "ab");
        assert_eq!(sanitize_folder("...///"), "uploads");
        assert_eq!(sanitize_folder(""), "uploads");
    }

    #[test]
    fn stored_names_are_prefixed_and_path_free() {
        let name = stored_file_name("/tmp/../hero image.png");
        assert!(name.ends_with("heroimage.png"));
        assert!(!name.contains('/'));
        assert_eq!(name.chars().filter(|c| *c == '_').count(), 1);

        let fallback = stored_file_name("///");
        assert!(fallback.ends_with("_file"));
    }
}
