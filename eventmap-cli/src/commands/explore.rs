//! Interactive map session driven from stdin.
//!
//! Map moves go through the viewport debouncer; loads, criteria changes and
//! focus sequences run as local tasks so the prompt stays responsive.

use std::rc::Rc;

use anyhow::Result;
use eventmap_core::marker::{GridClusterSurface, MarkerSignal};
use eventmap_core::{
    Bounds, EventId, FilterCriteria, LatLng, QueryStatus, QuickFilter, Session, ViewportDebouncer,
};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{LocalSet, spawn_local};

use crate::commands::list::print_events;
use crate::context::{Context, visible_bounds};
use crate::render::{Render, render_detail};

type MapSession = Rc<Session<GridClusterSurface>>;

enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
Commands:
  pan <dlat> <dlng>   move the map by degrees
  zoom <level>        change zoom (0-18)
  city <key>          jump to a configured city
  search [text]       set or clear the search text
  status <s>          upcoming, past or all
  quick <q>           all, saved or today
  save <id>           toggle saved state
  focus <id>          center on an event and open its popup
  open <id>           show event details
  list                events currently displayed
  map                 legend and clusters
  refresh             drop cache and reload
  quit";

pub async fn run(ctx: &Context, city: Option<&str>) -> Result<()> {
    let (session, mut signals) = ctx.session(city)?;
    let session: MapSession = Rc::new(session);
    let (viewport_tx, mut debouncer) = ViewportDebouncer::channel(ctx.config.debounce()?);

    LocalSet::new()
        .run_until(async move {
            let loads = {
                let session = session.clone();
                spawn_local(async move {
                    while let Some(bounds) = debouncer.next().await {
                        let session = session.clone();
                        spawn_local(async move {
                            let outcome = session.on_viewport(bounds).await;
                            println!("{}", outcome.render());
                        });
                    }
                })
            };

            println!("{}", HELP.dimmed());
            viewport_tx.send(visible_bounds(&session))?;

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line? else { break };
                        match handle(&session, &viewport_tx, line.trim()) {
                            Ok(Flow::Quit) => break,
                            Ok(Flow::Continue) => {}
                            Err(e) => println!("{} {}", "✗".red(), e),
                        }
                    }
                    Some(signal) = signals.recv() => match signal {
                        MarkerSignal::OpenDetail(id) => show_detail(&session, &id),
                    },
                }
            }

            loads.abort();
            Ok::<_, anyhow::Error>(())
        })
        .await
}

fn handle(session: &MapSession, viewport_tx: &UnboundedSender<Bounds>, line: &str) -> Result<Flow> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "help" => println!("{}", HELP.dimmed()),
        "quit" | "exit" => return Ok(Flow::Quit),
        "pan" => {
            let mut parts = rest.split_whitespace().map(str::parse::<f64>);
            let (Some(Ok(dlat)), Some(Ok(dlng))) = (parts.next(), parts.next()) else {
                anyhow::bail!("Usage: pan <dlat> <dlng>");
            };
            let (center, zoom) = view(session);
            move_map(
                session,
                viewport_tx,
                LatLng::new(center.lat + dlat, center.lng + dlng),
                zoom,
            )?;
        }
        "zoom" => {
            let zoom: u8 = rest.parse()?;
            let (center, _) = view(session);
            move_map(session, viewport_tx, center, zoom)?;
        }
        "city" => {
            session.set_city(rest)?;
            viewport_tx.send(visible_bounds(session))?;
        }
        "search" => {
            let mut criteria = session.criteria();
            criteria.search = rest.to_string();
            update_criteria(session, criteria);
        }
        "status" => {
            let mut criteria = session.criteria();
            criteria.status = QueryStatus::from_param(rest);
            update_criteria(session, criteria);
        }
        "quick" => {
            let mut criteria = session.criteria();
            criteria.quick = match rest {
                "saved" => QuickFilter::Saved,
                "today" => QuickFilter::Today,
                "all" | "" => QuickFilter::All,
                other => anyhow::bail!("Unknown quick filter '{}'", other),
            };
            update_criteria(session, criteria);
        }
        "save" => {
            let id = EventId::from(rest);
            if session.toggle_saved(&id) {
                println!("{} Saved {}", "★".yellow(), id);
            } else {
                println!("Removed {} from saved events", id);
            }
        }
        "focus" => {
            let session = session.clone();
            let id = EventId::from(rest);
            spawn_local(async move {
                let outcome = session.focus(&id).await;
                println!("{}", format!("focus {}: {:?}", id, outcome).dimmed());
            });
        }
        "open" => {
            if !session.click(&EventId::from(rest)) {
                anyhow::bail!("No marker for '{}' on the map", rest);
            }
        }
        "list" => {
            let displayed = session.displayed();
            print_events(&displayed, session.now(), session.zone(), &session.saved());
        }
        "map" => print_map(session),
        "refresh" => {
            let session = session.clone();
            spawn_local(async move {
                let outcome = session.refresh().await;
                println!("{}", outcome.render());
            });
        }
        other => anyhow::bail!("Unknown command '{}'. Type `help`.", other),
    }

    Ok(Flow::Continue)
}

fn view(session: &MapSession) -> (LatLng, u8) {
    let map = session.map().borrow();
    (map.surface().center(), map.surface().zoom())
}

fn move_map(
    session: &MapSession,
    viewport_tx: &UnboundedSender<Bounds>,
    center: LatLng,
    zoom: u8,
) -> Result<()> {
    session.map().borrow_mut().set_view(center, zoom);
    viewport_tx.send(visible_bounds(session))?;
    Ok(())
}

fn update_criteria(session: &MapSession, criteria: FilterCriteria) {
    let session = session.clone();
    spawn_local(async move {
        if let Some(outcome) = session.set_criteria(criteria).await {
            println!("{}", outcome.render());
        }
        println!("{}", session.legend().render());
    });
}

fn print_map(session: &MapSession) {
    let map = session.map().borrow();
    let surface = map.surface();
    let (center, zoom) = (surface.center(), surface.zoom());

    println!(
        "{}",
        format!("center {:.4}, {:.4} at zoom {}", center.lat, center.lng, zoom).dimmed()
    );
    println!("{}", map.legend().render());
    for cluster in surface.clusters() {
        println!("  {}", cluster.render());
    }
    for spec in surface.standalone() {
        let badge = if spec.saved { "★" } else { "•" };
        println!(
            "  {} {} {}",
            badge,
            spec.popup.title.bold(),
            format!("[{}]", spec.event_id).dimmed()
        );
    }
}

fn show_detail(session: &MapSession, id: &EventId) {
    let event = session.loader().store().get(id).cloned();
    match event {
        Some(event) => println!("{}", render_detail(&event, session.zone())),
        None => println!("{}", format!("{} is no longer loaded", id).dimmed()),
    }
}
