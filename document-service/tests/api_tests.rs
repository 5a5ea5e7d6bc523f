use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use document_service::{
    api::{
        router::{build_router, rate_limit_response},
        state::DocumentServiceAppState,
    },
    domain::{
        Window,
        attachment::MockAttachmentRepository,
        department::MockDepartmentRepository,
        document::MockDocumentRepository,
        signature::MockSignatureRepository,
        user::{MockUserRepository, UserCredentials},
    },
    infrastructure::{
        password::hash_password,
        token::{JwtConfig, TokenService, TokenType},
    },
};
use shared::{
    pagination::Paginator,
    types::{
        Attachment, Department, Document, DocumentListItem, DocumentPriority, DocumentStats,
        DocumentStatus, Signature, User, UserRole, UserSummary,
    },
};

const SECRET: &str = "api-tests-secret-with-enough-bytes-for-hs256";
const HOST: &str = "testserver";

#[derive(Default)]
struct Mocks {
    users: MockUserRepository,
    documents: MockDocumentRepository,
    attachments: MockAttachmentRepository,
    signatures: MockSignatureRepository,
    departments: MockDepartmentRepository,
}

impl Mocks {
    /// `find_by_id` resolves any of `known`; access tokens for them authenticate.
    fn with_users(mut self, known: Vec<User>) -> Self {
        self.users
            .expect_find_by_id()
            .returning(move |id| Ok(known.iter().find(|u| u.id == id).cloned()));
        self
    }

    fn app(self) -> Router {
        let state = Arc::new(DocumentServiceAppState {
            paginator: Paginator::default(),
            tokens: tokens(),
            public_base_url: None,
            user_repo: Arc::new(self.users),
            document_repo: Arc::new(self.documents),
            attachment_repo: Arc::new(self.attachments),
            signature_repo: Arc::new(self.signatures),
            department_repo: Arc::new(self.departments),
        });

        build_router(state)
    }
}

fn tokens() -> TokenService {
    TokenService::new(&JwtConfig::new(SECRET))
}

fn access_token(user: &User) -> String {
    tokens().issue_access(user.id, user.role).unwrap()
}

fn make_user(id: i64, role: UserRole) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        first_name: "Noor".to_string(),
        last_name: "Haddad".to_string(),
        role,
        is_active: true,
        date_joined: Utc::now(),
        last_login: None,
    }
}

fn make_list_item(id: i64) -> DocumentListItem {
    DocumentListItem {
        id,
        title: format!("Document {id}"),
        description: None,
        priority: DocumentPriority::Medium,
        department: "Finance".to_string(),
        status: DocumentStatus::Pending,
        created_at: Utc::now(),
    }
}

fn make_document(id: i64, uploader: &User) -> Document {
    let now = Utc::now();
    Document {
        id,
        title: "Budget 2025".to_string(),
        description: Some("Annual budget".to_string()),
        priority: DocumentPriority::High,
        department: "Finance".to_string(),
        status: DocumentStatus::Pending,
        uploaded_by: UserSummary::from(uploader),
        reviewed_by: None,
        comments: None,
        redirect_department: None,
        attachments: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn make_department(id: i64) -> Department {
    Department {
        id,
        name_ar: format!("قسم {id}"),
        name_en: format!("Department {id}"),
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).header(header::HOST, HOST);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn read_json(res: Response) -> Value {
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn assert_error_envelope(json: &Value) {
    assert_eq!(json["count"], 0);
    assert_eq!(json["results"], json!([]));
    assert!(json["next"].is_null());
    assert!(json["previous"].is_null());
    assert!(!json["errors"].as_object().unwrap().is_empty());
}

// region: Envelope and pagination

#[tokio::test]
async fn first_page_of_documents_links_to_second() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks.documents.expect_count().returning(|_, _| Ok(42));
    mocks
        .documents
        .expect_list()
        .withf(|_, _, window| *window == Some(Window { offset: 0, limit: 20 }))
        .returning(|_, _, _| Ok((1..=20).map(make_list_item).collect()));

    let res = mocks
        .app()
        .oneshot(get("/api/documents/list", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 42);
    assert_eq!(json["results"].as_array().unwrap().len(), 20);
    assert!(json["previous"].is_null());
    assert_eq!(json["next"], "http://testserver/api/documents/list?page=2");
    assert!(json.get("errors").is_none());
}

#[tokio::test]
async fn last_page_keeps_filters_in_previous_link() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks
        .documents
        .expect_count()
        .withf(|_, filter| filter.status == Some(DocumentStatus::Pending))
        .returning(|_, _| Ok(42));
    mocks
        .documents
        .expect_list()
        .withf(|_, _, window| *window == Some(Window { offset: 40, limit: 20 }))
        .returning(|_, _, _| Ok(vec![make_list_item(41), make_list_item(42)]));

    let res = mocks
        .app()
        .oneshot(get(
            "/api/documents/list?status=pending&page=last",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert!(json["next"].is_null());
    assert_eq!(
        json["previous"],
        "http://testserver/api/documents/list?page=2&status=pending"
    );
}

#[tokio::test]
async fn page_past_the_end_is_invalid_page() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks.documents.expect_count().returning(|_, _| Ok(42));

    let res = mocks
        .app()
        .oneshot(get("/api/documents/list?page=4", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(json["errors"]["non_field_errors"], json!(["Invalid page."]));
}

#[tokio::test]
async fn zero_page_size_is_rejected_on_its_own_key() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks.documents.expect_count().returning(|_, _| Ok(42));

    let res = mocks
        .app()
        .oneshot(get("/api/documents/list?page_size=0", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(
        json["errors"]["page_size"],
        json!(["A valid positive integer is required."])
    );
}

#[tokio::test]
async fn no_page_returns_everything_without_links() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks
        .documents
        .expect_list()
        .withf(|_, _, window| window.is_none())
        .returning(|_, _, _| Ok((1..=30).map(make_list_item).collect()));

    let res = mocks
        .app()
        .oneshot(get("/api/documents/list?no_page=true", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 30);
    assert_eq!(json["results"].as_array().unwrap().len(), 30);
    assert!(json["next"].is_null());
    assert!(json["previous"].is_null());
}

#[tokio::test]
async fn departments_are_paginated_in_memory() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .departments
        .expect_find_all_active()
        .returning(|| Ok((1..=25).map(make_department).collect()));

    let res = mocks
        .app()
        .oneshot(get(
            "/api/lookups/departments?page=2&page_size=10",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 25);
    let ids: Vec<i64> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, (11..=20).collect::<Vec<_>>());
    assert_eq!(
        json["previous"],
        "http://testserver/api/lookups/departments?page_size=10"
    );
    assert_eq!(
        json["next"],
        "http://testserver/api/lookups/departments?page=3&page_size=10"
    );
}

#[tokio::test]
async fn users_list_is_paginated() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let listed = ceo.clone();
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks
        .users
        .expect_count()
        .withf(|viewer| viewer.sees_everything())
        .returning(|_| Ok(1));
    mocks
        .users
        .expect_list()
        .returning(move |_, _| Ok(vec![listed.clone()]));

    let res = mocks
        .app()
        .oneshot(get("/api/user", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["username"], "user1");
}

// endregion: Envelope and pagination

// region: Documents

#[tokio::test]
async fn create_document_returns_201_single_envelope() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let created = make_document(11, &user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .documents
        .expect_create()
        .withf(|uploaded_by, doc| {
            *uploaded_by == 5
                && doc.title == "Budget 2025"
                && doc.priority == DocumentPriority::Medium
        })
        .returning(move |_, _| Ok(created.clone()));

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/create",
            Some(&token),
            json!({ "title": "Budget 2025", "department": "Finance" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert!(json["next"].is_null());
    assert_eq!(json["results"][0]["id"], 11);
    assert_eq!(json["results"][0]["uploaded_by"]["username"], "user5");
}

#[tokio::test]
async fn create_document_without_title_is_a_field_error() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mocks = Mocks::default().with_users(vec![user]);

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/create",
            Some(&token),
            json!({ "department": "Finance" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(json["errors"]["title"], json!(["This field is required."]));
}

#[tokio::test]
async fn malformed_json_is_a_non_field_error() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mocks = Mocks::default().with_users(vec![user]);

    let req = Request::builder()
        .method("POST")
        .uri("/api/documents/create")
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("{\"title\": "))
        .unwrap();
    let res = mocks.app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert!(json["errors"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn delete_document_confirms_with_id() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    let mut mocks = Mocks::default().with_users(vec![ceo]);
    mocks
        .documents
        .expect_delete()
        .withf(|_, id| *id == 7)
        .returning(|_, _| Ok(true));

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/documents/7")
        .header(header::HOST, HOST)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let res = mocks.app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        read_json(res).await,
        json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{ "message": "Resource with ID 7 deleted successfully" }]
        })
    );
}

#[tokio::test]
async fn invisible_document_is_not_found() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .documents
        .expect_find_by_id()
        .withf(|viewer, id| viewer.user_id == 5 && *id == 99)
        .returning(|_, _| Ok(None));

    let res = mocks
        .app()
        .oneshot(get("/api/documents/99", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = read_json(res).await;
    assert_eq!(json["errors"]["non_field_errors"], json!(["Not found."]));
}

#[tokio::test]
async fn change_status_requires_status() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mocks = Mocks::default().with_users(vec![user]);

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/3/change-status",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_eq!(json["errors"]["status"], json!(["Status is required"]));
}

#[tokio::test]
async fn change_status_to_in_review_returns_updated_document() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut reviewed = make_document(3, &user);
    reviewed.status = DocumentStatus::InReview;
    reviewed.reviewed_by = Some(UserSummary::from(&user));
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .documents
        .expect_change_status()
        .withf(|viewer, id, status| {
            viewer.user_id == 5 && *id == 3 && *status == DocumentStatus::InReview
        })
        .returning(move |_, _, _| Ok(Some(reviewed.clone())));

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/3/change-status",
            Some(&token),
            json!({ "status": "in_review" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["status"], "in_review");
    assert_eq!(json["results"][0]["reviewed_by"]["id"], 5);
}

#[tokio::test]
async fn stats_are_a_single_result() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks.documents.expect_stats().returning(|_| {
        Ok(DocumentStats {
            total_documents: 3,
            by_status: [("pending".to_string(), 3)].into_iter().collect(),
            ..Default::default()
        })
    });

    let res = mocks
        .app()
        .oneshot(get("/api/home/stats", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["total_documents"], 3);
    assert_eq!(json["results"][0]["by_status"]["pending"], 3);
}

// endregion: Documents

// region: Attachments and signatures

#[tokio::test]
async fn attachment_for_unknown_document_is_a_field_error() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks.attachments.expect_create().returning(|attachment| {
        Err(document_service::error::DocumentServiceError::field(
            "document",
            format!(
                "Invalid pk \"{}\" - object does not exist.",
                attachment.document
            ),
        ))
    });

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/attachments/create",
            Some(&token),
            json!({ "file": "documents/2025/01/01/a.pdf", "document": 404, "original_name": "a.pdf" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_eq!(
        json["errors"]["document"],
        json!(["Invalid pk \"404\" - object does not exist."])
    );
}

#[tokio::test]
async fn attachments_filter_by_document() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .attachments
        .expect_count()
        .withf(|document_id| *document_id == Some(3))
        .returning(|_| Ok(1));
    mocks
        .attachments
        .expect_list()
        .withf(|document_id, _| *document_id == Some(3))
        .returning(|_, _| {
            Ok(vec![Attachment {
                id: 8,
                document: 3,
                file: "documents/2025/01/01/a.pdf".to_string(),
                original_name: "a.pdf".to_string(),
                is_signed: false,
                created_at: Utc::now(),
            }])
        });

    let res = mocks
        .app()
        .oneshot(get(
            "/api/documents/attachments/list?document_id=3",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["document"], 3);
}

#[tokio::test]
async fn signature_is_recorded_for_the_caller() {
    let user = make_user(5, UserRole::Ceo);
    let token = access_token(&user);
    let signer = UserSummary::from(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    mocks
        .signatures
        .expect_create()
        .withf(|signed_by, signature| *signed_by == 5 && signature.attachment == 8)
        .returning(move |_, signature| {
            Ok(Signature {
                id: 1,
                attachment: signature.attachment,
                signed_by: signer.clone(),
                signature_data: signature.signature_data,
                signed_at: Utc::now(),
            })
        });

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/documents/signature/create",
            Some(&token),
            json!({ "attachment": 8, "signature_data": "data:image/png;base64,iVBORw0KGgo=" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = read_json(res).await;
    assert_eq!(json["results"][0]["signed_by"]["id"], 5);
}

// endregion: Attachments and signatures

// region: Users and auth

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let res = Mocks::default()
        .app()
        .oneshot(get("/api/documents/list", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(
        json["errors"]["non_field_errors"],
        json!(["Authentication credentials were not provided."])
    );
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let user = make_user(5, UserRole::Helpdesk);
    let refresh = tokens().issue_pair(user.id, user.role).unwrap().refresh;

    let res = Mocks::default()
        .app()
        .oneshot(get("/api/auth/profile", Some(&refresh)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_user_cannot_use_a_valid_token() {
    let mut user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    user.is_active = false;

    let res = Mocks::default()
        .with_users(vec![user])
        .app()
        .oneshot(get("/api/auth/profile", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_a_token_pair() {
    let user = make_user(5, UserRole::Helpdesk);
    let credentials = UserCredentials {
        user: user.clone(),
        password_hash: hash_password("correct-horse-battery").unwrap(),
    };
    let mut mocks = Mocks::default();
    mocks
        .users
        .expect_find_credentials()
        .withf(|username| username == "user5")
        .returning(move |_| Ok(Some(credentials.clone())));
    mocks
        .users
        .expect_record_login()
        .withf(|id| *id == 5)
        .returning(|_| Ok(()));

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/token",
            None,
            json!({ "username": "user5", "password": "correct-horse-battery" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    let access = json["results"][0]["access"].as_str().unwrap();
    let claims = tokens().verify(access, TokenType::Access).unwrap();
    assert_eq!(claims.sub, 5);
    assert!(json["results"][0]["refresh"].is_string());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let user = make_user(5, UserRole::Helpdesk);
    let credentials = UserCredentials {
        user,
        password_hash: hash_password("correct-horse-battery").unwrap(),
    };
    let mut mocks = Mocks::default();
    mocks
        .users
        .expect_find_credentials()
        .returning(move |_| Ok(Some(credentials.clone())));

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/token",
            None,
            json!({ "username": "user5", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = read_json(res).await;
    assert_eq!(
        json["errors"]["non_field_errors"],
        json!(["No active account found with the given credentials"])
    );
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let res = Mocks::default()
        .app()
        .oneshot(send_json(
            "POST",
            "/api/user",
            None,
            json!({
                "username": "amal",
                "email": "amal@example.com",
                "first_name": "Amal",
                "last_name": "Saleh",
                "password": "long-enough-1",
                "password2": "long-enough-2"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(
        json["errors"]["password"],
        json!(["Password fields didn't match."])
    );
}

#[tokio::test]
async fn register_hashes_password_and_defaults_role() {
    let mut mocks = Mocks::default();
    mocks
        .users
        .expect_create()
        .withf(|new| {
            new.username == "amal"
                && new.role == UserRole::Helpdesk
                && new.password_hash.starts_with("$argon2")
        })
        .returning(|new| {
            let mut user = make_user(9, new.role);
            user.username = new.username;
            Ok(user)
        });

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/user",
            None,
            json!({
                "username": "amal",
                "email": "amal@example.com",
                "first_name": "Amal",
                "last_name": "Saleh",
                "password": "long-enough-1",
                "password2": "long-enough-1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = read_json(res).await;
    assert_eq!(json["results"][0]["username"], "amal");
    assert!(json["results"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn helpdesk_cannot_see_other_users() {
    let user = make_user(5, UserRole::Helpdesk);
    let other = make_user(6, UserRole::Helpdesk);
    let token = access_token(&user);

    let res = Mocks::default()
        .with_users(vec![user, other])
        .app()
        .oneshot(get("/api/user/6", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_refuses_password() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);

    let res = Mocks::default()
        .with_users(vec![user])
        .app()
        .oneshot(send_json(
            "PUT",
            "/api/auth/profile/update",
            Some(&token),
            json!({ "first_name": "Rana", "password": "sneaky-change" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_eq!(
        json["errors"]["password"],
        json!(["Use the change password endpoint to update password"])
    );
}

#[tokio::test]
async fn change_password_checks_old_password() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);
    let mut mocks = Mocks::default().with_users(vec![user]);
    let hash = hash_password("old-password-1").unwrap();
    mocks
        .users
        .expect_password_hash()
        .returning(move |_| Ok(Some(hash.clone())));

    let res = mocks
        .app()
        .oneshot(send_json(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({ "old_password": "not-it", "new_password": "new-password-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = read_json(res).await;
    assert_eq!(
        json["errors"]["non_field_errors"],
        json!(["Incorrect old password"])
    );
}

// endregion: Users and auth

// region: Routing

#[tokio::test]
async fn headpat_is_a_single_envelope() {
    let res = Mocks::default()
        .app()
        .oneshot(get("/headpat", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = read_json(res).await;
    assert_eq!(json["count"], 1);
    assert!(json["results"][0]["message"].is_string());
}

#[tokio::test]
async fn unknown_route_is_an_error_envelope() {
    let res = Mocks::default()
        .app()
        .oneshot(get("/api/nothing/here", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(json["errors"]["non_field_errors"], json!(["Not found."]));
}

#[tokio::test]
async fn non_integer_id_is_not_found() {
    let user = make_user(5, UserRole::Helpdesk);
    let token = access_token(&user);

    let res = Mocks::default()
        .with_users(vec![user])
        .app()
        .oneshot(get("/api/lookups/departments/abc", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_error_envelope(&read_json(res).await);
}

#[tokio::test]
async fn wrong_method_is_an_error_envelope() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/documents/list")
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap();
    let res = Mocks::default().app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(
        json["errors"]["non_field_errors"],
        json!(["Method \"DELETE\" not allowed."])
    );
}

#[tokio::test]
async fn handler_panic_is_a_500_envelope() {
    let ceo = make_user(1, UserRole::Ceo);
    let token = access_token(&ceo);
    // No `count` expectation: the mock panics inside the handler.
    let mocks = Mocks::default().with_users(vec![ceo]);

    let res = mocks
        .app()
        .oneshot(get("/api/documents/list", Some(&token)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert_eq!(
        json["errors"]["non_field_errors"],
        json!(["A server error occurred."])
    );
}

#[tokio::test]
async fn throttled_request_is_an_error_envelope() {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(60)
        .burst_size(2)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .unwrap();
    let app = Mocks::default()
        .app()
        .layer(GovernorLayer::new(governor_conf).error_handler(rate_limit_response));
    let headpat = || {
        Request::builder()
            .uri("/headpat")
            .header(header::HOST, HOST)
            .header("x-forwarded-for", "10.1.1.1")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let res = app.clone().oneshot(headpat()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app.oneshot(headpat()).await.unwrap();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let json = read_json(res).await;
    assert_error_envelope(&json);
    assert!(
        json["errors"]["non_field_errors"][0]
            .as_str()
            .unwrap()
            .starts_with("Request was throttled.")
    );
}

// endregion: Routing
