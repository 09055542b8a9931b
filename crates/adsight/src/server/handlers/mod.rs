pub mod agent;
pub mod evaluation;
pub mod status;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::Json as ResponseJson;
use uuid::Uuid;

use crate::server::types::{ApiError, BaseResponse};

/// Error half of every handler result
pub type HandlerError = (StatusCode, ResponseJson<BaseResponse<()>>);

pub(crate) fn error_response(status: StatusCode, key: &str, message: &str, transaction_id: Uuid) -> HandlerError {
  let error = ApiError::new(key, message);
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// Bytes of the named multipart field, or None when the form lacks it
pub(crate) async fn read_upload(
  multipart: &mut Multipart,
  field_name: &str,
  transaction_id: Uuid,
) -> Result<Option<Vec<u8>>, HandlerError> {
  let malformed = |e: axum::extract::multipart::MultipartError| {
    error_response(e.status(), "invalid_multipart", &format!("Failed to read upload: {e}"), transaction_id)
  };

  while let Some(field) = multipart.next_field().await.map_err(malformed)? {
    if field.name() == Some(field_name) {
      let bytes = field.bytes().await.map_err(malformed)?;
      return Ok(Some(bytes.to_vec()));
    }
  }
  Ok(None)
}
