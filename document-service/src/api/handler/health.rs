use shared::responses::{Envelope, HeadpatResponse};

use crate::api::reply::{ApiResult, Reply};

#[utoipa::path(
    get,
    path = "/headpat",
    tag = "Health",
    operation_id = "headpat",
    responses(
        (status = 200, description = "Service is up", body = Envelope<HeadpatResponse>)
    )
)]
pub async fn headpat() -> ApiResult<HeadpatResponse> {
    Ok(Reply::single(HeadpatResponse {
        message: "nyaa~! all documents accounted for, senpai! (=^-w-^=)",
    }))
}
