use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Data, Request, Response};
use uuid::Uuid;

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
    }
}

#[options("/<_path..>")]
pub fn all_options(_path: std::path::PathBuf) -> Status {
    Status::Ok
}

#[derive(Clone, Copy)]
struct RequestStart {
    id: Uuid,
    at: Instant,
}

/// Logs one line per request with a generated request id and the elapsed time.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut Data<'_>) {
        request.local_cache(|| RequestStart {
            id: Uuid::new_v4(),
            at: Instant::now(),
        });
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let start = request.local_cache(|| RequestStart {
            id: Uuid::new_v4(),
            at: Instant::now(),
        });
        response.set_header(Header::new("X-Request-Id", start.id.to_string()));
        tracing::info!(
            request_id = %start.id,
            method = %request.method(),
            uri = %request.uri(),
            status = response.status().code,
            elapsed_ms = start.at.elapsed().as_millis() as u64,
            "request"
        );
    }
}
