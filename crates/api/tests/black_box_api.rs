use bizcard_api::config::AppConfig;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const PASSWORD: &str = "Abcdef1!";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let app = bizcard_api::app::build_app(AppConfig::in_memory(JWT_SECRET))
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register and return the issued token.
    async fn register(&self, email: &str, is_business: bool, is_admin: bool) -> String {
        let res = self
            .client
            .post(self.url("/api/users/register"))
            .json(&user_body(email, is_business, is_admin))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED, "register {email}");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn whoami(&self, token: &str) -> Value {
        let res = self
            .client
            .get(self.url("/api/users"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn create_card(&self, token: &str, biz_number: u64) -> reqwest::Response {
        self.client
            .post(self.url("/api/cards"))
            .bearer_auth(token)
            .json(&card_body(biz_number))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn user_body(email: &str, is_business: bool, is_admin: bool) -> Value {
    json!({
        "name": { "first": "Ada", "last": "Lovelace" },
        "phone": "0501234567",
        "email": email,
        "password": PASSWORD,
        "address": {
            "country": "Israel",
            "city": "Haifa",
            "street": "Herzl",
            "houseNumber": 5,
            "zip": 12345
        },
        "isBusiness": is_business,
        "isAdmin": is_admin
    })
}

fn card_body(biz_number: u64) -> Value {
    json!({
        "title": "Corner Coffee",
        "subtitle": "Fresh beans daily",
        "description": "Neighbourhood coffee shop",
        "phone": "0501234567",
        "email": "coffee@example.com",
        "web": "https://coffee.example.com",
        "image": { "url": "https://img.example.com/coffee.png", "alt": "cup" },
        "address": {
            "country": "Israel",
            "city": "Haifa",
            "street": "Herzl",
            "houseNumber": 12,
            "zip": 31000
        },
        "bizNumber": biz_number
    })
}

fn mint_foreign_jwt(secret: &str) -> String {
    let claims = json!({
        "_id": "01890a5d-ac96-774b-bcce-b302099a8057",
        "isAdmin": true,
        "isBusiness": true,
        "iat": Utc::now().timestamp(),
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login_issues_tokens() {
    let srv = TestServer::spawn().await;
    srv.register("a@b.com", false, false).await;

    let res = srv
        .client
        .post(srv.url("/api/users/login"))
        .json(&json!({ "email": "a@b.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let me = srv.whoami(token).await;
    assert_eq!(me["email"], "a@b.com");
    assert!(me.get("password").is_none());
    assert!(me["_id"].is_string());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.register("dup@example.com", false, false).await;

    let res = srv
        .client
        .post(srv.url("/api/users/register"))
        .json(&user_body("dup@example.com", false, false))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User already registered.");
}

#[tokio::test]
async fn wrong_password_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    srv.register("a@b.com", false, false).await;

    for (email, password) in [("a@b.com", "Wrong1!x"), ("nobody@b.com", PASSWORD)] {
        let res = srv
            .client
            .post(srv.url("/api/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Invalid email or password.");
    }
}

#[tokio::test]
async fn invalid_register_body_reports_the_field() {
    let srv = TestServer::spawn().await;
    let mut body = user_body("a@b.com", false, false);
    body["name"]["first"] = json!("A");

    let res = srv
        .client
        .post(srv.url("/api/users/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["message"],
        "\"name.first\" length must be at least 2 characters long"
    );
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access denied. No token provided.");

    let forged = mint_foreign_jwt("another-secret");
    let res = srv
        .client
        .get(srv.url("/api/users"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token.");
}

#[tokio::test]
async fn legacy_token_header_is_accepted() {
    let srv = TestServer::spawn().await;
    let token = srv.register("legacy@example.com", false, false).await;

    let res = srv
        .client
        .get(srv.url("/api/users"))
        .header("x-auth-token", token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_all_users_is_admin_only() {
    let srv = TestServer::spawn().await;
    let regular = srv.register("user@example.com", false, false).await;
    let admin = srv.register("admin@example.com", false, true).await;

    let res = srv
        .client
        .get(srv.url("/api/users/all"))
        .bearer_auth(&regular)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url("/api/users/all"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<Value> = res.json().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn users_cannot_touch_other_accounts() {
    let srv = TestServer::spawn().await;
    let alice = srv.register("alice@example.com", false, false).await;
    let bob = srv.register("bob@example.com", false, false).await;
    let bob_id = srv.whoami(&bob).await["_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{bob_id}")))
        .bearer_auth(&alice)
        .json(&user_body("bob@example.com", false, false))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/api/users/{bob_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&format!("/api/users/business/{bob_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn self_update_cannot_grant_admin() {
    let srv = TestServer::spawn().await;
    let token = srv.register("climber@example.com", false, false).await;
    let id = srv.whoami(&token).await["_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{id}")))
        .bearer_auth(&token)
        .json(&user_body("climber@example.com", false, true))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut body = user_body("climber@example.com", false, false);
    body["phone"] = json!("0509999999");
    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{id}")))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["phone"], "0509999999");
    assert_eq!(updated["isAdmin"], false);
}

#[tokio::test]
async fn business_toggle_and_delete_own_account() {
    let srv = TestServer::spawn().await;
    let token = srv.register("owner@example.com", false, false).await;
    let observer = srv.register("observer@example.com", false, false).await;
    let id = srv.whoami(&token).await["_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .patch(srv.url(&format!("/api/users/business/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["isBusiness"], true);

    let res = srv
        .client
        .delete(srv.url(&format!("/api/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully");

    let res = srv
        .client
        .get(srv.url(&format!("/api/users/profile/{id}")))
        .bearer_auth(&observer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The deleted account's token no longer authenticates.
    let res = srv
        .client
        .get(srv.url("/api/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token.");
}

#[tokio::test]
async fn profile_update_cannot_take_another_accounts_email() {
    let srv = TestServer::spawn().await;
    srv.register("a@x.com", false, false).await;
    let b = srv.register("b@x.com", false, false).await;
    let b_id = srv.whoami(&b).await["_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{b_id}")))
        .bearer_auth(&b)
        .json(&user_body("A@x.com", false, false))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User already registered.");
    assert_eq!(srv.whoami(&b).await["email"], "b@x.com");

    // Re-sending your own address, in any case, is not a conflict.
    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{b_id}")))
        .bearer_auth(&b)
        .json(&user_body("B@x.com", false, false))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn demoted_admin_loses_admin_routes_immediately() {
    let srv = TestServer::spawn().await;
    let admin = srv.register("boss@example.com", false, true).await;
    let id = srv.whoami(&admin).await["_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/users/update/{id}")))
        .bearer_auth(&admin)
        .json(&user_body("boss@example.com", false, false))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Same token, issued while still an admin.
    let res = srv
        .client
        .get(srv.url("/api/users/all"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_business_users_create_cards() {
    let srv = TestServer::spawn().await;
    let regular = srv.register("regular@example.com", false, false).await;

    let res = srv.create_card(&regular, 1_000_001).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Only business users can create cards");
}

#[tokio::test]
async fn business_toggle_takes_effect_without_a_new_token() {
    let srv = TestServer::spawn().await;
    let token = srv.register("late@example.com", false, false).await;
    let id = srv.whoami(&token).await["_id"].as_str().unwrap().to_string();

    srv.client
        .patch(srv.url(&format!("/api/users/business/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let res = srv.create_card(&token, 1_000_002).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn created_card_belongs_to_the_caller() {
    let srv = TestServer::spawn().await;
    let biz = srv.register("biz@example.com", true, false).await;
    let biz_id = srv.whoami(&biz).await["_id"].as_str().unwrap().to_string();

    let mut body = card_body(1_000_003);
    body["user_id"] = json!("someone-else");
    let res = srv
        .client
        .post(srv.url("/api/cards"))
        .bearer_auth(&biz)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let card: Value = res.json().await.unwrap();
    assert_eq!(card["user_id"], biz_id.as_str());
    assert_eq!(card["likes"], json!([]));

    let res = srv
        .client
        .get(srv.url("/api/cards/my-cards"))
        .bearer_auth(&biz)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let mine: Vec<Value> = res.json().await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn biz_number_is_unique_across_cards() {
    let srv = TestServer::spawn().await;
    let biz = srv.register("biz@example.com", true, false).await;

    let first: Value = srv.create_card(&biz, 1_000_010).await.json().await.unwrap();
    let second: Value = srv.create_card(&biz, 1_000_011).await.json().await.unwrap();
    let first_id = first["_id"].as_str().unwrap();
    let second_id = second["_id"].as_str().unwrap();

    let res = srv.create_card(&biz, 1_000_010).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Business number already exists");

    // A card may keep its own number on update.
    let mut update = card_body(1_000_010);
    update["title"] = json!("Corner Coffee II");
    let res = srv
        .client
        .put(srv.url(&format!("/api/cards/{first_id}")))
        .bearer_auth(&biz)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Corner Coffee II");

    // But not take another card's.
    let res = srv
        .client
        .patch(srv.url(&format!("/api/cards/bizNumber/{second_id}")))
        .bearer_auth(&biz)
        .json(&json!({ "bizNumber": 1_000_010 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .patch(srv.url(&format!("/api/cards/bizNumber/{second_id}")))
        .bearer_auth(&biz)
        .json(&json!({ "bizNumber": 1_000_012 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let changed: Value = res.json().await.unwrap();
    assert_eq!(changed["bizNumber"], 1_000_012);
}

#[tokio::test]
async fn non_owners_cannot_modify_cards_but_admins_can() {
    let srv = TestServer::spawn().await;
    let owner = srv.register("owner@example.com", true, false).await;
    let other = srv.register("other@example.com", true, false).await;
    let admin = srv.register("admin@example.com", false, true).await;

    let card: Value = srv.create_card(&owner, 1_000_020).await.json().await.unwrap();
    let id = card["_id"].as_str().unwrap();

    let res = srv
        .client
        .put(srv.url(&format!("/api/cards/{id}")))
        .bearer_auth(&other)
        .json(&card_body(1_000_020))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/api/cards/{id}")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/api/cards/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], format!("Card with id {id} deleted successfully"));

    let res = srv
        .client
        .get(srv.url(&format!("/api/cards/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_users_cannot_like_cards() {
    let srv = TestServer::spawn().await;
    let biz = srv.register("biz@example.com", true, false).await;
    let gone = srv.register("gone@example.com", false, false).await;
    let gone_id = srv.whoami(&gone).await["_id"].as_str().unwrap().to_string();

    let card: Value = srv.create_card(&biz, 1_000_050).await.json().await.unwrap();
    let id = card["_id"].as_str().unwrap();

    srv.client
        .delete(srv.url(&format!("/api/users/{gone_id}")))
        .bearer_auth(&gone)
        .send()
        .await
        .unwrap();

    let res = srv
        .client
        .patch(srv.url(&format!("/api/cards/like/{id}")))
        .bearer_auth(&gone)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url(&format!("/api/cards/{id}")))
        .send()
        .await
        .unwrap();
    let card: Value = res.json().await.unwrap();
    assert_eq!(card["likes"], json!([]));
}

#[tokio::test]
async fn biz_number_beyond_bigint_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let biz = srv.register("biz@example.com", true, false).await;

    let res = srv.create_card(&biz, 9_223_372_036_854_775_809).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv.create_card(&biz, i64::MAX as u64).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn liking_twice_restores_the_card() {
    let srv = TestServer::spawn().await;
    let biz = srv.register("biz@example.com", true, false).await;
    let fan = srv.register("fan@example.com", false, false).await;
    let fan_id = srv.whoami(&fan).await["_id"].as_str().unwrap().to_string();

    let card: Value = srv.create_card(&biz, 1_000_030).await.json().await.unwrap();
    let id = card["_id"].as_str().unwrap();

    let like = || {
        srv.client
            .patch(srv.url(&format!("/api/cards/like/{id}")))
            .bearer_auth(&fan)
            .send()
    };

    let liked: Value = like().await.unwrap().json().await.unwrap();
    assert_eq!(liked["likes"], json!([fan_id]));

    let unliked: Value = like().await.unwrap().json().await.unwrap();
    assert_eq!(unliked["likes"], json!([]));
}

#[tokio::test]
async fn card_listing_reports_likes_for_the_viewer() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/cards")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let biz = srv.register("biz@example.com", true, false).await;
    let fan = srv.register("fan@example.com", false, false).await;
    let card: Value = srv.create_card(&biz, 1_000_040).await.json().await.unwrap();
    let id = card["_id"].as_str().unwrap();
    srv.client
        .patch(srv.url(&format!("/api/cards/like/{id}")))
        .bearer_auth(&fan)
        .send()
        .await
        .unwrap();

    // Anonymous
    let res = srv.client.get(srv.url("/api/cards")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cards: Vec<Value> = res.json().await.unwrap();
    assert_eq!(cards[0]["likesCount"], 1);
    assert_eq!(cards[0]["isLikedByCurrentUser"], false);
    assert!(cards[0].get("likes").is_none());

    // Authenticated viewer who liked it
    let res = srv
        .client
        .get(srv.url("/api/cards"))
        .bearer_auth(&fan)
        .send()
        .await
        .unwrap();
    let cards: Vec<Value> = res.json().await.unwrap();
    assert_eq!(cards[0]["isLikedByCurrentUser"], true);

    // A bad token is still rejected on the optional route.
    let res = srv
        .client
        .get(srv.url("/api/cards"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(srv.url("/api/cards/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No card with id not-a-uuid found");
}

#[tokio::test]
async fn unmatched_routes_get_a_json_404() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(srv.url("/api/nothing-here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Page not found");
    assert_eq!(body["message"], "The route '/api/nothing-here' does not exist");
}
