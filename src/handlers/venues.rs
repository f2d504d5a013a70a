use super::{ListingForm, page};
use crate::error::{Error, Result};
use crate::forms::VenueForm;
use crate::models::Venue;
use crate::router::{AppState, Request, Response};
use crate::views;
use serde_json::json;

pub async fn index(req: Request, state: AppState) -> Result<Response> {
    let areas = views::venue_areas(&state.db, views::now()).await?;
    page(&state, &req, "pages/venues.html", &json!({ "areas": areas }))
}

pub async fn search(req: Request, state: AppState) -> Result<Response> {
    let term = req.form.text("search_term");
    let results = views::search_venues(&state.db, &term, views::now()).await?;
    page(&state, &req, "pages/search_venues.html", &json!({ "results": results }))
}

pub async fn show(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("venue_id")?;
    let venue = views::venue_detail(&state.db, id, views::now()).await?;
    page(&state, &req, "pages/show_venue.html", &json!({ "venue": venue }))
}

pub async fn create_form(req: Request, state: AppState) -> Result<Response> {
    let form = VenueForm::default();
    let view = ListingForm::new(None, &form, "", &[], &[]);
    page(&state, &req, "forms/new_venue.html", &view)
}

pub async fn create(req: Request, state: AppState) -> Result<Response> {
    let form = VenueForm::from_form(&req.form);
    let venue = match form.validate() {
        Ok(venue) => venue,
        Err(errors) => {
            let view = ListingForm::new(None, &form, &form.state, &form.genres, &errors);
            return Ok(page(&state, &req, "forms/new_venue.html", &view)?.with_status(400));
        }
    };
    let response = Response::redirect("/venues");
    match Venue::insert(&state.db, &venue).await {
        Ok(_) => Ok(response.flash(format!("Venue {} was successfully listed!", venue.name))),
        Err(e) => {
            log::error!("Creating venue `{}` failed: {}", venue.name, e);
            Ok(response.flash(format!(
                "An error occurred. Venue {} could not be listed.",
                venue.name
            )))
        }
    }
}

pub async fn delete(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("venue_id")?;
    let response = Response::redirect("/venues");
    match Venue::delete(&state.db, id).await {
        Ok(()) => Ok(response.flash("Venue was successfully deleted!")),
        Err(e @ Error::NotFound(_)) => Err(e),
        Err(e) => {
            log::error!("Deleting venue {} failed: {}", id, e);
            Ok(response.flash("There was an error deleting venue"))
        }
    }
}

pub async fn edit_form(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("venue_id")?;
    let venue = Venue::find(&state.db, id).await?;
    let form = VenueForm::from_venue(&venue, venue.genres(&state.db).await?);
    let view = ListingForm::new(Some(id), &form, &form.state, &form.genres, &[]);
    page(&state, &req, "forms/edit_venue.html", &view)
}

pub async fn edit(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("venue_id")?;
    Venue::find(&state.db, id).await?;
    let form = VenueForm::from_form(&req.form);
    let venue = match form.validate() {
        Ok(venue) => venue,
        Err(errors) => {
            let view = ListingForm::new(Some(id), &form, &form.state, &form.genres, &errors);
            return Ok(page(&state, &req, "forms/edit_venue.html", &view)?.with_status(400));
        }
    };
    let response = Response::redirect(format!("/venues/{id}"));
    match Venue::update(&state.db, id, &venue).await {
        Ok(()) => Ok(response.flash(format!("Venue {} was successfully updated!", venue.name))),
        Err(e @ Error::NotFound(_)) => Err(e),
        Err(e) => {
            log::error!("Updating venue {} failed: {}", id, e);
            Ok(response.flash(format!(
                "An error occurred. Venue {} could not be updated.",
                venue.name
            )))
        }
    }
}
