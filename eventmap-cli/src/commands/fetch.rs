use anyhow::Result;
use owo_colors::OwoColorize;

use crate::args::FilterArgs;
use crate::commands::list::print_events;
use crate::context::{Context, visible_bounds};
use crate::render::Render;
use crate::utils::tui::create_spinner;

/// Load events around a city and print the ones passing the filters.
pub async fn run(ctx: &Context, city: Option<&str>, filters: &FilterArgs, force: bool) -> Result<()> {
    let criteria = filters.criteria()?;
    let preset = ctx.city(city)?.clone();
    let (session, _signals) = ctx.session(city)?;

    // Set the endpoint query before the first load so it is not issued twice
    session.loader().set_query(&criteria.search, criteria.status);
    session.set_criteria(criteria).await;

    let bounds = visible_bounds(&session);
    let spinner = create_spinner(format!("Loading events around {}...", preset.name));
    let outcome = if force {
        let outcome = session.loader().load(Some(bounds), true).await;
        session.refresh_markers();
        outcome
    } else {
        session.on_viewport(bounds).await
    };
    spinner.finish_and_clear();

    println!("{}", outcome.render());
    println!("{}", format!("Area: {}", bounds).dimmed());
    println!();

    let displayed = session.displayed();
    print_events(&displayed, session.now(), session.zone(), &session.saved());
    println!();
    println!("{}", session.legend().render());

    Ok(())
}
