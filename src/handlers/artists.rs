use super::{ListingForm, page};
use crate::error::{Error, Result};
use crate::forms::ArtistForm;
use crate::models::Artist;
use crate::router::{AppState, Request, Response};
use crate::views;
use serde_json::json;

pub async fn index(req: Request, state: AppState) -> Result<Response> {
    let artists = views::artist_list(&state.db).await?;
    page(&state, &req, "pages/artists.html", &json!({ "artists": artists }))
}

pub async fn search(req: Request, state: AppState) -> Result<Response> {
    let term = req.form.text("search_term");
    let results = views::search_artists(&state.db, &term, views::now()).await?;
    page(&state, &req, "pages/search_artists.html", &json!({ "results": results }))
}

pub async fn show(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("artist_id")?;
    let artist = views::artist_detail(&state.db, id, views::now()).await?;
    page(&state, &req, "pages/show_artist.html", &json!({ "artist": artist }))
}

pub async fn create_form(req: Request, state: AppState) -> Result<Response> {
    let form = ArtistForm::default();
    let view = ListingForm::new(None, &form, "", &[], &[]);
    page(&state, &req, "forms/new_artist.html", &view)
}

pub async fn create(req: Request, state: AppState) -> Result<Response> {
    let form = ArtistForm::from_form(&req.form);
    let artist = match form.validate() {
        Ok(artist) => artist,
        Err(errors) => {
            let view = ListingForm::new(None, &form, &form.state, &form.genres, &errors);
            return Ok(page(&state, &req, "forms/new_artist.html", &view)?.with_status(400));
        }
    };
    let response = Response::redirect("/artists");
    match Artist::insert(&state.db, &artist).await {
        Ok(_) => Ok(response.flash(format!("Artist {} was successfully listed!", artist.name))),
        Err(e) => {
            log::error!("Creating artist `{}` failed: {}", artist.name, e);
            Ok(response.flash(format!(
                "An error occurred. Artist {} could not be listed.",
                artist.name
            )))
        }
    }
}

pub async fn delete(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("artist_id")?;
    let response = Response::redirect("/artists");
    match Artist::delete(&state.db, id).await {
        Ok(()) => Ok(response.flash("Artist was successfully deleted!")),
        Err(e @ Error::NotFound(_)) => Err(e),
        Err(e) => {
            log::error!("Deleting artist {} failed: {}", id, e);
            Ok(response.flash("There was an error deleting artist"))
        }
    }
}

pub async fn edit_form(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("artist_id")?;
    let artist = Artist::find(&state.db, id).await?;
    let form = ArtistForm::from_artist(&artist, artist.genres(&state.db).await?);
    let view = ListingForm::new(Some(id), &form, &form.state, &form.genres, &[]);
    page(&state, &req, "forms/edit_artist.html", &view)
}

pub async fn edit(req: Request, state: AppState) -> Result<Response> {
    let id = req.id_param("artist_id")?;
    Artist::find(&state.db, id).await?;
    let form = ArtistForm::from_form(&req.form);
    let artist = match form.validate() {
        Ok(artist) => artist,
        Err(errors) => {
            let view = ListingForm::new(Some(id), &form, &form.state, &form.genres, &errors);
            return Ok(page(&state, &req, "forms/edit_artist.html", &view)?.with_status(400));
        }
    };
    let response = Response::redirect(format!("/artists/{id}"));
    match Artist::update(&state.db, id, &artist).await {
        Ok(()) => Ok(response.flash(format!("Artist {} was successfully updated!", artist.name))),
        Err(e @ Error::NotFound(_)) => Err(e),
        Err(e) => {
            log::error!("Updating artist {} failed: {}", id, e);
            Ok(response.flash(format!(
                "An error occurred. Artist {} could not be updated.",
                artist.name
            )))
        }
    }
}
