//! Colored terminal rendering for eventmap-core types.

use chrono::{DateTime, Utc};
use eventmap_core::marker::{Cluster, Legend, Recency};
use eventmap_core::{CalendarZone, DeliveryMode, Event, LoadOutcome, TicketType};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Render with knowledge of the current time and display zone.
pub trait RenderAt {
    fn render_at(&self, now: DateTime<Utc>, zone: CalendarZone, saved: bool) -> String;
}

fn colorize_recency(recency: Recency, text: &str) -> String {
    match recency {
        Recency::Today => text.red().bold().to_string(),
        Recency::Soon => text.yellow().to_string(),
        Recency::Later => text.to_string(),
        Recency::Past => text.dimmed().to_string(),
    }
}

impl RenderAt for Event {
    fn render_at(&self, now: DateTime<Utc>, zone: CalendarZone, saved: bool) -> String {
        let recency = Recency::classify(self.start_time, now, zone);
        let when = zone.local_time(self.start_time).format("%a %b %-d %H:%M");
        let star = if saved { "★".yellow().to_string() } else { " ".to_string() };

        let mut tags = Vec::new();
        if self.is_hot {
            tags.push("hot".red().to_string());
        }
        match self.mode {
            Some(DeliveryMode::Online) => tags.push("online".cyan().to_string()),
            Some(DeliveryMode::Offline) | None => {}
        }
        if self.ticket_type == Some(TicketType::Free) {
            tags.push("free".green().to_string());
        }
        if self.coordinate().is_none() {
            tags.push("no location".dimmed().to_string());
        }

        let mut line = format!(
            "{} {} {} {}",
            star,
            format!("{:>16}", when).dimmed(),
            colorize_recency(recency, &self.title),
            format!("[{}]", self.id).dimmed()
        );
        if !self.address.is_empty() {
            line.push_str(&format!(" {}", self.address.dimmed()));
        }
        if !tags.is_empty() {
            line.push_str(&format!(" ({})", tags.join(", ")));
        }
        line
    }
}

impl Render for LoadOutcome {
    fn render(&self) -> String {
        match self {
            LoadOutcome::InFlight => "Already loading".dimmed().to_string(),
            LoadOutcome::Covered => "Area already loaded".dimmed().to_string(),
            LoadOutcome::Fetched { received, total } => format!(
                "{} {} received, {} known",
                "✓".green(),
                received,
                total
            ),
            LoadOutcome::Failed => format!("{} Failed to load events", "✗".red()),
        }
    }
}

impl Render for Legend {
    fn render(&self) -> String {
        format!(
            "{} today  {} this week  {} later  {} past  {} saved",
            self.today.to_string().red(),
            self.soon.to_string().yellow(),
            self.later,
            self.past.to_string().dimmed(),
            self.saved.to_string().yellow()
        )
    }
}

impl Render for Cluster {
    fn render(&self) -> String {
        format!(
            "◉ {} events near {:.4}, {:.4}",
            self.members.len().to_string().bold(),
            self.center.lat,
            self.center.lng
        )
    }
}

/// Full detail view for one event.
pub fn render_detail(event: &Event, zone: CalendarZone) -> String {
    let mut lines = vec![event.title.bold().to_string()];
    lines.push(format!(
        "  {}",
        zone.local_time(event.start_time).format("%A %B %-d %Y, %H:%M")
    ));
    if !event.address.is_empty() {
        lines.push(format!("  {}", event.address));
    }
    if let Some(org) = &event.org_name {
        lines.push(format!("  {} {}", "by".dimmed(), org));
    }
    if let Some(kind) = &event.event_type {
        lines.push(format!("  {} {}", "type".dimmed(), kind));
    }
    if !event.description.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", event.description));
    }
    lines.join("\n")
}
