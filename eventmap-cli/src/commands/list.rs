use anyhow::Result;
use chrono::{DateTime, Utc};
use eventmap_core::filter;
use eventmap_core::{CalendarZone, Event, FilterContext, SavedEvents};
use owo_colors::OwoColorize;

use crate::args::FilterArgs;
use crate::context::Context;
use crate::render::RenderAt;

/// Show cached events matching the filters, without contacting the endpoint.
pub fn run(ctx: &Context, filters: &FilterArgs) -> Result<()> {
    let criteria = filters.criteria()?;
    let events = ctx.cache()?.load();
    let saved = ctx.saved();
    let now = Utc::now();

    let filter_ctx = FilterContext::new(now, ctx.zone, saved.ids());
    let shown = filter::apply(&events, &criteria, &filter_ctx);

    if events.is_empty() {
        println!(
            "{}",
            "No cached events. Run `eventmap fetch` first.".dimmed()
        );
        return Ok(());
    }

    print_events(&shown, now, ctx.zone, &saved);
    println!(
        "\n{}",
        format!("{} of {} cached events", shown.len(), events.len()).dimmed()
    );
    Ok(())
}

/// Print events grouped by day, in the order given.
pub fn print_events(events: &[Event], now: DateTime<Utc>, zone: CalendarZone, saved: &SavedEvents) {
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    let mut current_label: Option<String> = None;
    for event in events {
        let label = day_label(event.start_time, now, zone);
        if current_label.as_ref() != Some(&label) {
            if current_label.is_some() {
                println!();
            }
            println!("{}", label.bold());
            current_label = Some(label);
        }
        println!("  {}", event.render_at(now, zone, saved.contains(&event.id)));
    }
}

/// "Today", "Tomorrow", "Yesterday" or e.g. "Wed Feb 25"
fn day_label(start: DateTime<Utc>, now: DateTime<Utc>, zone: CalendarZone) -> String {
    match zone.days_between(now, start) {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => zone.date_of(start).format("%a %b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, d, h, 0, 0).unwrap()
    }

    #[test]
    fn relative_day_labels() {
        let zone: CalendarZone = "UTC".parse().unwrap();
        let now = utc(25, 10);

        assert_eq!(day_label(utc(25, 23), now, zone), "Today");
        assert_eq!(day_label(utc(26, 1), now, zone), "Tomorrow");
        assert_eq!(day_label(utc(24, 1), now, zone), "Yesterday");
        assert_eq!(day_label(utc(28, 9), now, zone), "Fri Feb 28");
    }
}
