use super::page;
use crate::error::Result;
use crate::forms::{FieldError, ShowForm};
use crate::models::{Artist, Show, Venue};
use crate::router::{AppState, Request, Response};
use crate::views;
use serde::Serialize;
use serde_json::json;

/// An `<option>` naming a venue or artist.
#[derive(Serialize)]
struct Pick {
    id: i64,
    name: String,
    selected: bool,
}

#[derive(Serialize)]
struct ShowFormPage<'a> {
    form: &'a ShowForm,
    errors: &'a [FieldError],
    artists: Vec<Pick>,
    venues: Vec<Pick>,
}

async fn form_page(
    req: &Request,
    state: &AppState,
    form: &ShowForm,
    errors: &[FieldError],
) -> Result<Response> {
    let artists = Artist::all(&state.db)
        .await?
        .into_iter()
        .map(|a| Pick {
            selected: form.artist_id == a.id.to_string(),
            id: a.id,
            name: a.name,
        })
        .collect();
    let venues = Venue::all(&state.db)
        .await?
        .into_iter()
        .map(|v| Pick {
            selected: form.venue_id == v.id.to_string(),
            id: v.id,
            name: v.name,
        })
        .collect();
    let view = ShowFormPage {
        form,
        errors,
        artists,
        venues,
    };
    page(state, req, "forms/new_show.html", &view)
}

pub async fn index(req: Request, state: AppState) -> Result<Response> {
    let shows = views::show_list(&state.db).await?;
    page(&state, &req, "pages/shows.html", &json!({ "shows": shows }))
}

pub async fn create_form(req: Request, state: AppState) -> Result<Response> {
    form_page(&req, &state, &ShowForm::default(), &[]).await
}

pub async fn create(req: Request, state: AppState) -> Result<Response> {
    let form = ShowForm::from_form(&req.form);
    let show = match form.validate() {
        Ok(show) => show,
        Err(errors) => {
            return Ok(form_page(&req, &state, &form, &errors).await?.with_status(400));
        }
    };
    let response = Response::redirect("/shows");
    match Show::insert(&state.db, &show).await {
        Ok(_) => Ok(response.flash("Show was successfully listed!")),
        Err(e) => {
            log::error!(
                "Creating show (artist {}, venue {}) failed: {}",
                show.artist_id,
                show.venue_id,
                e
            );
            Ok(response.flash("An error occurred. Show could not be listed."))
        }
    }
}
