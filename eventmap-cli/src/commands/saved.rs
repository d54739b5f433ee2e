use anyhow::Result;
use chrono::Utc;
use eventmap_core::EventId;
use owo_colors::OwoColorize;

use crate::commands::list::print_events;
use crate::context::Context;

pub fn save(ctx: &Context, id: &str) -> Result<()> {
    let mut saved = ctx.saved();
    if saved.save(EventId::from(id)) {
        println!("{} Saved {}", "★".yellow(), id);
    } else {
        println!("{}", format!("{} was already saved", id).dimmed());
    }
    Ok(())
}

pub fn unsave(ctx: &Context, id: &str) -> Result<()> {
    let mut saved = ctx.saved();
    if saved.unsave(&EventId::from(id)) {
        println!("{} Removed {} from saved events", "✓".green(), id);
    } else {
        println!("{}", format!("{} was not saved", id).dimmed());
    }
    Ok(())
}

/// List saved events. Ids with no cached event are listed by id only.
pub fn list(ctx: &Context) -> Result<()> {
    let saved = ctx.saved();
    if saved.is_empty() {
        println!("{}", "No saved events".dimmed());
        return Ok(());
    }

    let cached = ctx.cache()?.load();
    let (known, unknown): (Vec<_>, Vec<_>) = saved
        .ids()
        .iter()
        .partition(|id| cached.iter().any(|e| &e.id == *id));

    let events: Vec<_> = cached
        .into_iter()
        .filter(|e| known.contains(&&e.id))
        .collect();
    print_events(&events, Utc::now(), ctx.zone, &saved);

    if !unknown.is_empty() {
        println!();
        println!("{}", "Not in cache:".dimmed());
        for id in unknown {
            println!("  {}", id);
        }
    }
    Ok(())
}
