use axum::{
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};

/// Form field the admin page posts CSV files under.
pub const CSV_FIELD: &str = "csv-file";

/// Reads the `csv-file` part of a multipart form. The file must carry a
/// `.csv` name and must not be empty.
pub async fn read_csv_field(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::bad_request("Invalid file"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Read error: {e}")))?;
        if data.is_empty() {
            return Err(AppError::bad_request("Empty file"));
        }
        tracing::debug!(filename = %filename, bytes = data.len(), "csv upload received");
        return Ok(data.to_vec());
    }
    Err(AppError::bad_request("No file part"))
}

pub fn csv_attachment(filename: &str, body: impl Into<Vec<u8>>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body.into(),
    )
        .into_response()
}
