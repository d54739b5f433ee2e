//! Command-line filter options.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use eventmap_core::{DeliveryMode, FilterCriteria, QueryStatus, QuickFilter, TicketType};

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Text to look for in title or address
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this category (e.g. "music")
    #[arg(long = "type")]
    pub event_type: Option<String>,

    /// Any of these categories, comma separated
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// Only events on this day (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// upcoming, past or all
    #[arg(long, default_value = "upcoming")]
    pub status: String,

    /// offline or online
    #[arg(long)]
    pub mode: Option<String>,

    /// Only popular events
    #[arg(long)]
    pub hot: bool,

    /// free or paid
    #[arg(long)]
    pub ticket: Option<String>,

    /// Only saved events
    #[arg(long, conflicts_with = "today")]
    pub saved: bool,

    /// Only events today
    #[arg(long)]
    pub today: bool,
}

fn parse_mode(s: &str) -> Result<DeliveryMode> {
    match s.to_ascii_lowercase().as_str() {
        "offline" | "in-person" => Ok(DeliveryMode::Offline),
        "online" => Ok(DeliveryMode::Online),
        other => bail!("Unknown mode '{}' (expected offline or online)", other),
    }
}

fn parse_ticket(s: &str) -> Result<TicketType> {
    match s.to_ascii_lowercase().as_str() {
        "free" => Ok(TicketType::Free),
        "paid" => Ok(TicketType::Paid),
        other => bail!("Unknown ticket type '{}' (expected free or paid)", other),
    }
}

impl FilterArgs {
    pub fn criteria(&self) -> Result<FilterCriteria> {
        let quick = if self.saved {
            QuickFilter::Saved
        } else if self.today {
            QuickFilter::Today
        } else {
            QuickFilter::All
        };

        Ok(FilterCriteria {
            search: self.search.clone().unwrap_or_default(),
            event_type: self.event_type.clone().unwrap_or_default(),
            types: self.types.clone(),
            date: self.date,
            status: QueryStatus::from_param(&self.status),
            mode: self.mode.as_deref().map(parse_mode).transpose()?,
            hot: self.hot.then_some(true),
            ticket_type: self.ticket.as_deref().map(parse_ticket).transpose()?,
            quick,
        })
    }
}
