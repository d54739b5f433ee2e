//! Test doubles shared by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

use crate::error::{EventMapError, EventMapResult};
use crate::event::Event;
use crate::query::{EventQuery, EventSource};

/// Source that replays scripted responses and records every query.
///
/// When the script runs dry it answers with an empty list. With a gate set,
/// each fetch waits for `release()` before answering.
#[derive(Default)]
pub struct StubSource {
    responses: RefCell<VecDeque<EventMapResult<Vec<Event>>>>,
    queries: RefCell<Vec<EventQuery>>,
    gate: Option<Rc<Notify>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Rc<Notify>) -> Self {
        StubSource {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn respond(&self, events: Vec<Event>) {
        self.responses.borrow_mut().push_back(Ok(events));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(EventMapError::Fetch(message.to_string())));
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.borrow().len()
    }
}

#[async_trait(?Send)]
impl EventSource for StubSource {
    async fn fetch(&self, query: &EventQuery) -> EventMapResult<Vec<Event>> {
        self.queries.borrow_mut().push(query.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn placed(id: &str, title: &str, start: DateTime<Utc>, lat: f64, lng: f64) -> Event {
    Event::new(id, title, start).with_coordinate(lat, lng)
}
