//! Pet Store example for axoapi
//!
//! A small in-memory pet API whose routes document themselves:
//! - routes grouped under `/api/v1` with an admin group guarded by a key
//! - request and response bodies registered as schema components
//! - the schema endpoints wrapped in their own middleware
//!
//! Run with: cargo run -p petstore
//! Then visit: http://127.0.0.1:8080/openapi
//!
//! `AXOAPI_ADDR`, `AXOAPI_SCHEMA_PATH` and friends (or a `.env` file)
//! override the defaults.

use axoapi_rs::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

// ============================================
// Data Models
// ============================================

/// A pet in the store
#[derive(Debug, Clone, Serialize, Deserialize, Schema)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub tag: Option<String>,
}

/// Request body for adding a pet
#[derive(Debug, Deserialize, Schema)]
pub struct NewPet {
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
}

// ============================================
// In-Memory Store
// ============================================

#[derive(Debug, Default)]
struct Store {
    pets: BTreeMap<u64, Pet>,
    next_id: u64,
}

type Db = Arc<RwLock<Store>>;

// ============================================
// Handlers
// ============================================

async fn list_pets(Extension(db): Extension<Db>, Query(params): Query<ListParams>) -> Json<Vec<Pet>> {
    let store = db.read().unwrap_or_else(|e| e.into_inner());
    let pets = store
        .pets
        .values()
        .filter(|pet| params.tag.is_none() || pet.tag == params.tag)
        .cloned()
        .collect();
    Json(pets)
}

async fn find_pet(Extension(db): Extension<Db>, Path(id): Path<u64>) -> Response {
    let store = db.read().unwrap_or_else(|e| e.into_inner());
    match store.pets.get(&id) {
        Some(pet) => Json(pet.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("pet {} not found", id)).into_response(),
    }
}

async fn add_pet(Extension(db): Extension<Db>, Json(new): Json<NewPet>) -> (StatusCode, Json<Pet>) {
    let mut store = db.write().unwrap_or_else(|e| e.into_inner());
    store.next_id += 1;
    let pet = Pet {
        id: store.next_id,
        name: new.name,
        tag: new.tag,
    };
    store.pets.insert(pet.id, pet.clone());
    tracing::info!(id = pet.id, name = %pet.name, "pet added");
    (StatusCode::CREATED, Json(pet))
}

async fn delete_pet(Extension(db): Extension<Db>, Path(id): Path<u64>) -> StatusCode {
    let mut store = db.write().unwrap_or_else(|e| e.into_inner());
    match store.pets.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

fn require_admin_key() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        let authorized = req
            .headers()
            .get("x-admin-key")
            .is_some_and(|key| key == "letmein");
        if authorized {
            next.run(req).await
        } else {
            StatusCode::UNAUTHORIZED.into_response()
        }
    })
}

fn log_schema_fetch() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        tracing::info!(path = %req.uri().path(), "schema requested");
        next.run(req).await
    })
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::from_env()?;
    let mut engine = Engine::from_config(config);

    engine
        .info(
            Info::new("Pet Store", "1.0.0")
                .description("A sample API that uses a pet store as an example")
                .license("MIT", None),
        )
        .use_middleware([TracingLayer::new().into()])
        .layer(Extension(Db::default()))
        .schema_middleware([log_schema_fetch()])
        .schema_ui_options(RedocOptions::builtin().expand_responses("200,201"));

    engine.group("/api/v1", |api| {
        api.get(
            "/pets",
            Operation::new()
                .summary("List pets")
                .tag("pets")
                .parameter(Parameter::query("tag").description("Only pets with this tag"))
                .response(200, "All pets"),
            list_pets,
        )
        .get(
            "/pets/:id",
            Operation::new()
                .summary("Find pet by ID")
                .tag("pets")
                .json_response::<Pet>(200, "The pet")
                .response(404, "No such pet"),
            find_pet,
        )
        .post(
            "/pets",
            Operation::new()
                .summary("Add a new pet")
                .tag("pets")
                .json_body::<NewPet>()
                .json_response::<Pet>(201, "The stored pet"),
            add_pet,
        );

        api.group_with("/admin", [require_admin_key()], |admin| {
            admin.delete(
                "/pets/:id",
                Operation::new()
                    .summary("Delete a pet")
                    .tag("admin")
                    .response(204, "Deleted")
                    .response(404, "No such pet"),
                delete_pet,
            );
        });
    });

    for route in engine.routes() {
        tracing::debug!(method = %route.method, path = %route.path, "route registered");
    }

    engine.run_default().await
}
