use crate::{
    api::{attendance, stats},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/scan
                    .service(
                        web::resource("/scan")
                            .wrap(scan_limiter.clone())
                            .route(web::post().to(attendance::scan)),
                    )
                    // /attendance/check-out
                    .service(
                        web::resource("/check-out")
                            .wrap(scan_limiter)
                            .route(web::post().to(attendance::check_out)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(attendance::get_attendance)),
                    )
                    // /attendance/{id}/justification
                    .service(
                        web::resource("/{id}/justification")
                            .route(web::post().to(attendance::submit_justification)),
                    )
                    // /attendance/{id}/disposition
                    .service(
                        web::resource("/{id}/disposition")
                            .route(web::put().to(attendance::dispose_justification)),
                    )
                    // /attendance/{id}/force-approve
                    .service(
                        web::resource("/{id}/force-approve")
                            .route(web::post().to(attendance::force_approve)),
                    ),
            )
            .service(
                web::scope("/stats")
                    .service(web::resource("/daily").route(web::get().to(stats::daily)))
                    .service(web::resource("/weekly").route(web::get().to(stats::weekly)))
                    .service(web::resource("/monthly").route(web::get().to(stats::monthly)))
                    .service(web::resource("/yearly").route(web::get().to(stats::yearly))),
            ),
    );
}
