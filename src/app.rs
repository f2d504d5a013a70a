//! Wiring: database setup and the route table.

use crate::error::Result;
use crate::handlers::{artists, pages, shows, venues};
use crate::models::MIGRATIONS;
use crate::orm::{Db, apply_migration_files, auto_migrate};
use crate::router::{AppState, Middleware, PostMiddleware, RequestContext, Response, Router};
use crate::settings::Settings;
use crate::{flash, route, template};
use std::sync::Arc;
use std::time::Instant;

/// Connect, migrate every model and apply the optional `*.sql` files.
pub async fn init_db(settings: &Settings) -> Result<Arc<Db>> {
    let db = Arc::new(Db::connect(&settings.database_url).await?);
    auto_migrate(db.clone(), MIGRATIONS).await?;
    if let Some(dir) = &settings.migrations_dir {
        let applied = apply_migration_files(db.clone(), dir).await?;
        log::info!("Applied {} migration file(s) from {}", applied, dir);
    }
    Ok(db)
}

fn request_timer() -> Middleware {
    Arc::new(|ctx: &mut RequestContext| {
        ctx.start_time = Some(Instant::now());
        None
    })
}

fn request_logger() -> PostMiddleware {
    Arc::new(|ctx: &RequestContext, response: Response| {
        let elapsed = ctx.start_time.map(|t| t.elapsed()).unwrap_or_default();
        log::info!(
            "{} {} -> {} ({:.2?})",
            ctx.method,
            ctx.path,
            response.status_code,
            elapsed
        );
        response
    })
}

/// Every route of the directory. Fixed segments come before `:id` ones.
pub fn build_router(state: AppState) -> Router {
    template::set_display_logs(state.settings.template.debug);

    let mut router = Router::new();
    route!(router,
        GET "/" => { pages::index },

        GET "/venues" => { venues::index },
        POST "/venues/search" => { venues::search },
        GET "/venues/create" => { venues::create_form },
        POST "/venues/create" => { venues::create },
        GET "/venues/delete/:venue_id" => { venues::delete },
        GET "/venues/:venue_id" => { venues::show },
        GET "/venues/:venue_id/edit" => { venues::edit_form },
        POST "/venues/:venue_id/edit" => { venues::edit },

        GET "/artists" => { artists::index },
        POST "/artists/search" => { artists::search },
        GET "/artists/create" => { artists::create_form },
        POST "/artists/create" => { artists::create },
        GET "/artists/delete/:artist_id" => { artists::delete },
        GET "/artists/:artist_id" => { artists::show },
        GET "/artists/:artist_id/edit" => { artists::edit_form },
        POST "/artists/:artist_id/edit" => { artists::edit },

        GET "/shows" => { shows::index },
        GET "/shows/create" => { shows::create_form },
        POST "/shows/create" => { shows::create },
    );

    router.add_middleware(request_timer());
    router.add_post_middleware(Arc::new(flash::persist));
    router.add_post_middleware(request_logger());
    router.set_app_state(state);
    router
}
