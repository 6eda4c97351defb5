//! Single binary API server: player signup/login plus admin console endpoints.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:5001 by default so the React console can reach it in dev.
//! Override with env: HOST, PORT, DB_FILE, ADMIN_EMAIL, ADMIN_PASSWORD, JWT_SECRET.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use bgmi_tournament_api::{
    auth, auth::Role, login, register_with_otp, request_otp, DepositStatus, Device, Error,
    JoinStatus, Storage,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

/// Shared state: the SQLite storage handle (rusqlite connections are not Sync).
type Db = Data<Mutex<Storage>>;

/// Admin credentials and token signing secret, read from env at startup.
#[derive(Clone)]
struct AppConfig {
    admin_email: String,
    admin_password: String,
    jwt_secret: String,
}

/// How often used/expired OTP rows are swept.
const OTP_PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct SendOtpBody {
    email: String,
}

#[derive(Deserialize)]
struct VerifyOtpBody {
    email: String,
    code: String,
    name: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct AdminLoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateJoinBody {
    player_name: String,
    game_id: String,
    device: Device,
    slot: String,
}

#[derive(Deserialize)]
struct JoinStatusBody {
    status: JoinStatus,
}

#[derive(Deserialize)]
struct CreateRoomBody {
    room_id: String,
    password: String,
    match_type: String,
    map: String,
    starts_at: String,
}

#[derive(Deserialize)]
struct CreateDepositBody {
    user_name: String,
    profile_id: String,
    email: String,
    amount: i64,
    utr: String,
}

/// Path segment: record id (e.g. /admin/users/{id}).
#[derive(Deserialize)]
struct IdPath {
    id: i64,
}

/// Deposit review action taken by the admin.
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum DepositAction {
    Approve,
    Reject,
}

/// Path segments: deposit id and action (e.g. /api/admin/deposit/{id}/approve).
#[derive(Deserialize)]
struct DepositActionPath {
    id: i64,
    action: DepositAction,
}

/// Map a library error to its HTTP status with a JSON `{ "error": ... }` body.
fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::Validation { .. } | Error::InvalidOtp | Error::OtpExpired => {
            HttpResponse::BadRequest().json(body)
        }
        Error::InvalidCredentials | Error::Token(_) => HttpResponse::Unauthorized().json(body),
        Error::EmailRegistered(_) | Error::InvalidTransition { .. } => {
            HttpResponse::Conflict().json(body)
        }
        Error::NotFound { .. } => HttpResponse::NotFound().json(body),
        _ => {
            log::error!("Internal error: {}", err);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "internal error" }))
        }
    }
}

/// Check the Authorization header for a valid admin bearer token.
fn require_admin(req: &HttpRequest, cfg: &AppConfig) -> Result<(), HttpResponse> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            return Err(HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": "missing bearer token" })))
        }
    };
    match auth::verify_token(&cfg.jwt_secret, token) {
        Ok(claims) if claims.role == Role::Admin => Ok(()),
        Ok(_) => Err(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "admin token required" }))),
        Err(_) => Err(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "invalid or expired token" }))),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bgmi-tournament-api",
    })
}

/// Health at the root too (uptime checks hit `/`).
#[get("/")]
async fn root_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bgmi-tournament-api",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Issue a signup OTP. No mail integration: the code is logged and returned
/// in `dev_otp`, as the original deployment did.
#[post("/auth/send-otp")]
async fn auth_send_otp(state: Db, body: Json<SendOtpBody>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match request_otp(&g, &body.email) {
        Ok(otp) => {
            log::info!("OTP generated for {}: {}", otp.email, otp.code);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "OTP generated",
                "dev_otp": otp.code,
            }))
        }
        Err(e) => error_response(&e),
    }
}

/// Verify an OTP and register the player.
#[post("/auth/verify-otp")]
async fn auth_verify_otp(state: Db, body: Json<VerifyOtpBody>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match register_with_otp(&g, &body.email, &body.code, &body.name, &body.password) {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user.profile(),
        })),
        Err(e) => error_response(&e),
    }
}

/// Player login: returns a signed token and the public profile.
#[post("/auth/login")]
async fn auth_login(state: Db, cfg: Data<AppConfig>, body: Json<LoginBody>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let user = match login(&g, &body.email, &body.password) {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };
    match auth::sign_player_token(&cfg.jwt_secret, &user.email) {
        Ok(token) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "token": token,
            "user": user.profile(),
        })),
        Err(e) => error_response(&e),
    }
}

/// Admin login against the configured credentials.
#[post("/api/admin/login")]
async fn admin_login(cfg: Data<AppConfig>, body: Json<AdminLoginBody>) -> HttpResponse {
    if body.email != cfg.admin_email || body.password != cfg.admin_password {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Invalid admin credentials",
        }));
    }
    match auth::sign_admin_token(&cfg.jwt_secret, &body.email) {
        Ok(token) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "token": token,
        })),
        Err(e) => error_response(&e),
    }
}

/// List registered players (public profiles, newest first).
#[get("/admin/users")]
async fn admin_list_users(req: HttpRequest, state: Db, cfg: Data<AppConfig>) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.list_users() {
        Ok(users) => {
            let profiles: Vec<_> = users.iter().map(|u| u.profile()).collect();
            HttpResponse::Ok().json(profiles)
        }
        Err(e) => error_response(&e),
    }
}

/// Delete a registered player.
#[delete("/admin/users/{id}")]
async fn admin_delete_user(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    path: Path<IdPath>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.delete_user(path.id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "User not found" }))
        }
        Err(e) => error_response(&e),
    }
}

/// Player-facing: register for a tournament slot.
#[post("/api/joins")]
async fn create_join(state: Db, body: Json<CreateJoinBody>) -> HttpResponse {
    let player_name = body.player_name.trim();
    let game_id = body.game_id.trim();
    let slot = body.slot.trim();
    if player_name.is_empty() || game_id.is_empty() || slot.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "player_name, game_id, slot required" }));
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.create_join(player_name, game_id, body.device, slot) {
        Ok(join) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "join": join,
        })),
        Err(e) => error_response(&e),
    }
}

/// List all tournament joins (admin review queue).
#[get("/api/admin/joins")]
async fn admin_list_joins(req: HttpRequest, state: Db, cfg: Data<AppConfig>) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.list_joins() {
        Ok(joins) => HttpResponse::Ok().json(serde_json::json!({ "joins": joins })),
        Err(e) => error_response(&e),
    }
}

/// Confirm or reject a join entry.
#[put("/api/admin/joins/{id}/status")]
async fn admin_set_join_status(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    path: Path<IdPath>,
    body: Json<JoinStatusBody>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.set_join_status(path.id, body.status) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(&e),
    }
}

/// Remove a join entry.
#[delete("/api/admin/joins/{id}")]
async fn admin_delete_join(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    path: Path<IdPath>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.delete_join(path.id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Join not found" }))
        }
        Err(e) => error_response(&e),
    }
}

/// Player-facing: list published room credentials.
#[get("/api/rooms")]
async fn list_rooms(state: Db) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.list_rooms() {
        Ok(rooms) => HttpResponse::Ok().json(serde_json::json!({ "rooms": rooms })),
        Err(e) => error_response(&e),
    }
}

/// Publish a custom room.
#[post("/api/admin/rooms")]
async fn admin_create_room(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    body: Json<CreateRoomBody>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let room_id = body.room_id.trim();
    let password = body.password.trim();
    let starts_at = body.starts_at.trim();
    if room_id.is_empty() || password.is_empty() || starts_at.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "room_id, password, starts_at required" }));
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.create_room(room_id, password, &body.match_type, &body.map, starts_at) {
        Ok(room) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "room": room,
        })),
        Err(e) => error_response(&e),
    }
}

/// Remove a room.
#[delete("/api/admin/rooms/{id}")]
async fn admin_delete_room(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    path: Path<IdPath>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.delete_room(path.id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Room not found" }))
        }
        Err(e) => error_response(&e),
    }
}

/// Player-facing: submit a deposit request for admin review.
#[post("/api/deposits")]
async fn create_deposit(state: Db, body: Json<CreateDepositBody>) -> HttpResponse {
    let utr = body.utr.trim();
    let email = body.email.trim();
    if body.amount <= 0 {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "amount must be positive" }));
    }
    if utr.is_empty() || email.is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "email, utr required" }));
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.create_deposit(
        body.user_name.trim(),
        body.profile_id.trim(),
        email,
        body.amount,
        utr,
    ) {
        Ok(deposit) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "deposit": deposit,
        })),
        Err(e) => error_response(&e),
    }
}

/// List all deposit requests (admin review queue).
#[get("/api/admin/deposits")]
async fn admin_list_deposits(req: HttpRequest, state: Db, cfg: Data<AppConfig>) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.list_deposits() {
        Ok(deposits) => HttpResponse::Ok().json(serde_json::json!({ "deposits": deposits })),
        Err(e) => error_response(&e),
    }
}

/// Approve or reject a pending deposit.
#[put("/api/admin/deposit/{id}/{action}")]
async fn admin_update_deposit(
    req: HttpRequest,
    state: Db,
    cfg: Data<AppConfig>,
    path: Path<DepositActionPath>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let status = match path.action {
        DepositAction::Approve => DepositStatus::Approved,
        DepositAction::Reject => DepositStatus::Rejected,
    };
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.set_deposit_status(path.id, status) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(&e),
    }
}

/// Counters for the dashboard cards.
#[get("/api/admin/stats")]
async fn admin_stats(req: HttpRequest, state: Db, cfg: Data<AppConfig>) -> HttpResponse {
    if let Err(resp) = require_admin(&req, &cfg) {
        return resp;
    }
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.stats() {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let db_file = std::env::var("DB_FILE").unwrap_or_else(|_| "bgmi.db".to_string());

    let config = AppConfig {
        admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| {
            log::warn!("ADMIN_EMAIL not set, using dev default");
            "admin@bgmi.com".to_string()
        }),
        admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            log::warn!("ADMIN_PASSWORD not set, using dev default");
            "Admin@123".to_string()
        }),
        jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using dev default");
            "dev-secret-change-me".to_string()
        }),
    };

    let storage = match Storage::open(&db_file) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open database {}: {}", db_file, e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    log::info!("SQLite DB connected at {}", db_file);

    // Uploads directory for static serving (payment screenshots etc.)
    let _ = std::fs::create_dir_all("uploads");

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(Mutex::new(storage));
    let config = Data::new(config);

    // Background task: every 10 minutes, sweep used and expired OTP rows
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(OTP_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let g = match state_cleanup.lock() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            match g.prune_otps(Utc::now()) {
                Ok(0) => {}
                Ok(n) => log::info!("Pruned {} expired/used OTP(s)", n),
                Err(e) => log::warn!("OTP prune failed: {}", e),
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config.clone())
            .wrap(Cors::permissive())
            .service(root_health)
            .service(api_health)
            .service(favicon)
            .service(auth_send_otp)
            .service(auth_verify_otp)
            .service(auth_login)
            .service(admin_login)
            .service(admin_list_users)
            .service(admin_delete_user)
            .service(create_join)
            .service(admin_list_joins)
            .service(admin_set_join_status)
            .service(admin_delete_join)
            .service(list_rooms)
            .service(admin_create_room)
            .service(admin_delete_room)
            .service(create_deposit)
            .service(admin_list_deposits)
            .service(admin_update_deposit)
            .service(admin_stats)
            .service(Files::new("/uploads", "uploads"))
    })
    .bind(bind)?
    .run()
    .await
}
