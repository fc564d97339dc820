use actix_web::web;

use crate::handlers::absence;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/absence-requests")
            .route("", web::post().to(absence::create_request))
            .route("/{id}", web::get().to(absence::get_request))
            .route("/{id}", web::delete().to(absence::delete_request))
            .route("/{id}/history", web::get().to(absence::get_request_history))
            .route("/{id}/approve", web::post().to(absence::approve_request))
            .route("/{id}/decline", web::post().to(absence::decline_request))
            .route("/{id}/archive", web::post().to(absence::archive_request)),
    );
}
