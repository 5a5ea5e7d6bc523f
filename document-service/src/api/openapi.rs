use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use super::handler::{attachment, auth, department, document, health, signature, stats, user};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::headpat,
        auth::obtain_token,
        auth::refresh_token,
        auth::logout,
        auth::profile,
        auth::update_profile,
        auth::change_password,
        user::find_all,
        user::register,
        user::find_by_id,
        user::update,
        user::delete,
        stats::document_stats,
        document::find_all,
        document::create,
        document::find_by_id,
        document::update,
        document::delete,
        document::change_status,
        attachment::find_all,
        attachment::create,
        attachment::find_by_id,
        attachment::update,
        attachment::delete,
        signature::find_all,
        signature::create,
        signature::find_by_id,
        signature::update,
        signature::delete,
        department::find_all,
        department::find_by_id,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Tokens and the caller's own account"),
        (name = "Users", description = "User management"),
        (name = "Home", description = "Dashboard aggregates"),
        (name = "Documents", description = "Document workflow"),
        (name = "Attachments", description = "Files attached to documents"),
        (name = "Signatures", description = "Attachment signatures"),
        (name = "Lookups", description = "Reference data"),
    )
)]
pub struct ApiDoc;

/// Registers the `jwt` bearer scheme referenced by `security(("jwt" = []))`.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
