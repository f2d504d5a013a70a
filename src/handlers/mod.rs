//! Route handlers. Each one maps a request onto a query and a template.

pub mod artists;
pub mod pages;
pub mod shows;
pub mod venues;

use crate::error::Result;
use crate::forms::{Choice, FieldError, genre_choices, state_choices};
use crate::router::{AppState, Request, Response};
use crate::template::{self, TemplateValue};
use serde::Serialize;

/// Render `template_name` with the fields of `view` plus the pending flash messages.
pub(crate) fn page<T: Serialize>(
    state: &AppState,
    req: &Request,
    template_name: &str,
    view: &T,
) -> Result<Response> {
    let mut context = template::context_from(view)?;
    context.insert(
        "messages".to_string(),
        TemplateValue::List(req.flashes.iter().map(|m| m.as_str().into()).collect()),
    );
    let body = template::render_template(&state.settings.template.dir, template_name, &context)?;
    Ok(Response::html(body))
}

/// Context of the venue and artist forms.
#[derive(Serialize)]
pub(crate) struct ListingForm<'a, F: Serialize> {
    /// Set when editing an existing row
    pub id: Option<i64>,
    pub form: &'a F,
    pub errors: &'a [FieldError],
    pub states: Vec<Choice>,
    pub genres: Vec<Choice>,
}

impl<'a, F: Serialize> ListingForm<'a, F> {
    pub fn new(
        id: Option<i64>,
        form: &'a F,
        state: &str,
        genres: &[String],
        errors: &'a [FieldError],
    ) -> Self {
        ListingForm {
            id,
            form,
            errors,
            states: state_choices(state),
            genres: genre_choices(genres),
        }
    }
}
