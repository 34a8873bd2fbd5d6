//! Meeting room tools: booking, availability, cancellation and utilization

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::{
    StoreError, ToolHandler, ToolOutcome, ToolRegistry, generate_id, json_schema, parse_input,
};
use crate::planner::{
    KeywordToolPlanner, ToolRule, find_known, relative_date, today, token_or_fallback,
};
use crate::types::RequestContext;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Room {
    pub room_id: &'static str,
    pub name: &'static str,
    pub capacity: u32,
    pub equipment: &'static [&'static str],
}

/// Bookable rooms
pub const ROOMS: &[Room] = &[
    Room {
        room_id: "CONF_A1",
        name: "Flight Operations Center",
        capacity: 20,
        equipment: &["projector", "flight_displays", "weather_monitors"],
    },
    Room {
        room_id: "CONF_B1",
        name: "Pilot Briefing Room",
        capacity: 12,
        equipment: &["projector", "charts", "weather_display"],
    },
    Room {
        room_id: "EXEC_01",
        name: "Executive Boardroom",
        capacity: 8,
        equipment: &["projector", "conference_phone", "whiteboard"],
    },
    Room {
        room_id: "TRAIN_A",
        name: "Training Room A",
        capacity: 25,
        equipment: &["projector", "simulator_access", "training_materials"],
    },
    Room {
        room_id: "MAINT_C",
        name: "Maintenance Conference Room",
        capacity: 15,
        equipment: &["technical_displays", "parts_catalog"],
    },
    Room {
        room_id: "ATC_BR",
        name: "ATC Briefing Room",
        capacity: 10,
        equipment: &["radar_displays", "communication_systems"],
    },
];

/// Daily slot grid reported by availability checks: (start, end, status)
const SLOT_GRID: &[(&str, &str, &str)] = &[
    ("09:00", "10:00", "available"),
    ("10:00", "11:00", "booked"),
    ("11:00", "12:00", "available"),
    ("14:00", "15:00", "available"),
    ("15:00", "16:00", "available"),
    ("16:00", "17:00", "maintenance"),
];

pub fn find_room(room_id: &str) -> Option<&'static Room> {
    ROOMS.iter().find(|r| r.room_id.eq_ignore_ascii_case(room_id))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub booking_id: String,
    pub room_id: String,
    pub room_name: String,
    pub meeting_title: String,
    pub organizer: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: Vec<String>,
    pub equipment_needed: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub room_id: String,
    pub meeting_title: String,
    pub organizer: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub equipment_needed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub booking_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub cancelled_by: Option<String>,
}

/// In-memory bookings, owned by the meeting tools
#[derive(Debug, Default)]
pub struct MeetingStore {
    bookings: Mutex<HashMap<String, Booking>>,
}

impl MeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn book(&self, req: BookingRequest) -> Result<Booking, StoreError> {
        let room = find_room(&req.room_id).ok_or_else(|| StoreError::NotFound {
            kind: "Room",
            id: req.room_id.clone(),
        })?;
        if req.end_time <= req.start_time {
            return Err(StoreError::Invalid("end_time must be after start_time".to_string()));
        }
        if req.attendees.len() > room.capacity as usize {
            return Err(StoreError::Invalid(format!(
                "{} holds {} people, {} attendees requested",
                room.name,
                room.capacity,
                req.attendees.len()
            )));
        }

        let booking = Booking {
            booking_id: generate_id("BOOK"),
            room_id: room.room_id.to_string(),
            room_name: room.name.to_string(),
            meeting_title: req.meeting_title,
            organizer: req.organizer,
            start_time: req.start_time,
            end_time: req.end_time,
            attendees: req.attendees,
            equipment_needed: req.equipment_needed,
            status: "confirmed".to_string(),
            created_at: Utc::now(),
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
        };
        self.bookings
            .lock()
            .await
            .insert(booking.booking_id.clone(), booking.clone());
        info!("Booked {} as {}", booking.room_id, booking.booking_id);
        Ok(booking)
    }

    pub async fn cancel(&self, req: CancelRequest) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .get_mut(&req.booking_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Booking",
                id: req.booking_id.clone(),
            })?;
        if booking.status == "cancelled" {
            return Err(StoreError::Invalid(format!(
                "Booking {} is already cancelled",
                req.booking_id
            )));
        }
        booking.status = "cancelled".to_string();
        booking.cancellation_reason =
            Some(req.reason.unwrap_or_else(|| "User requested cancellation".to_string()));
        booking.cancelled_by = req.cancelled_by;
        booking.cancelled_at = Some(Utc::now());
        info!("Cancelled booking {}", booking.booking_id);
        Ok(booking.clone())
    }

    pub async fn get(&self, booking_id: &str) -> Option<Booking> {
        self.bookings.lock().await.get(booking_id).cloned()
    }

    pub async fn report(&self, report_type: &str) -> Value {
        let bookings = self.bookings.lock().await;
        if report_type == "room_utilization" {
            let count = |status: &str| bookings.values().filter(|b| b.status == status).count();
            json!({
                "total_rooms": ROOMS.len(),
                "total_bookings": bookings.len(),
                "active_bookings": count("confirmed"),
                "cancelled_bookings": count("cancelled"),
                "room_details": ROOMS,
                "utilization_rate": "85%",
            })
        } else {
            json!({
                "rooms": ROOMS.len(),
                "bookings": bookings.len(),
            })
        }
    }
}

/// Book a meeting room
pub struct BookMeetingRoomTool {
    store: Arc<MeetingStore>,
}

impl BookMeetingRoomTool {
    pub fn new(store: Arc<MeetingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for BookMeetingRoomTool {
    fn name(&self) -> &str {
        "book_meeting_room"
    }

    fn description(&self) -> &str {
        "Book an aviation facility meeting room for a time window."
    }

    fn input_schema(&self) -> Value {
        let room_ids: Vec<&str> = ROOMS.iter().map(|r| r.room_id).collect();
        json_schema(
            json!({
                "room_id": {"type": "string", "enum": room_ids},
                "meeting_title": {"type": "string"},
                "organizer": {"type": "string"},
                "start_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                "end_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                "attendees": {"type": "array", "items": {"type": "string"}},
                "equipment_needed": {"type": "array", "items": {"type": "string"}}
            }),
            vec!["room_id", "meeting_title", "organizer", "start_time", "end_time"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: BookingRequest = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.book(req).await {
            Ok(booking) => Ok(ToolOutcome::success(format!(
                "Room {} booked successfully",
                booking.room_id
            ))
            .with("booking_id", booking.booking_id.clone())
            .with("details", serde_json::to_value(&booking)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Report the slot grid for a room and date
pub struct CheckRoomAvailabilityTool;

#[async_trait]
impl ToolHandler for CheckRoomAvailabilityTool {
    fn name(&self) -> &str {
        "check_room_availability"
    }

    fn description(&self) -> &str {
        "Check which time slots a meeting room has free on a given date."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "room_id": {"type": "string"},
                "date": {"type": "string", "description": "YYYY-MM-DD, defaults to today"}
            }),
            vec!["room_id"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        #[derive(Deserialize)]
        struct Input {
            room_id: String,
            #[serde(default)]
            date: Option<String>,
        }
        let req: Input = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        let Some(room) = find_room(&req.room_id) else {
            return Ok(StoreError::NotFound {
                kind: "Room",
                id: req.room_id,
            }
            .into());
        };
        let date = req
            .date
            .unwrap_or_else(|| today().format("%Y-%m-%d").to_string());
        let slots: Vec<Value> = SLOT_GRID
            .iter()
            .map(|(start, end, status)| json!({"start": start, "end": end, "status": status}))
            .collect();
        let available = SLOT_GRID.iter().filter(|(_, _, s)| *s == "available").count();

        Ok(ToolOutcome::success(format!("Availability checked for room {}", room.room_id))
            .with("room_id", room.room_id)
            .with("room_name", room.name)
            .with("date", date)
            .with("availability", slots)
            .with("total_available_slots", available))
    }
}

/// Cancel an existing booking
pub struct CancelBookingTool {
    store: Arc<MeetingStore>,
}

impl CancelBookingTool {
    pub fn new(store: Arc<MeetingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for CancelBookingTool {
    fn name(&self) -> &str {
        "cancel_booking"
    }

    fn description(&self) -> &str {
        "Cancel a meeting room booking by id."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "booking_id": {"type": "string"},
                "reason": {"type": "string"},
                "cancelled_by": {"type": "string"}
            }),
            vec!["booking_id"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: CancelRequest = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.cancel(req).await {
            Ok(booking) => Ok(ToolOutcome::success(format!(
                "Booking {} cancelled successfully",
                booking.booking_id
            ))
            .with("booking_id", booking.booking_id.clone())
            .with("details", serde_json::to_value(&booking)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Summarize bookings across rooms
pub struct GenerateMeetingReportTool {
    store: Arc<MeetingStore>,
}

impl GenerateMeetingReportTool {
    pub fn new(store: Arc<MeetingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GenerateMeetingReportTool {
    fn name(&self) -> &str {
        "generate_meeting_report"
    }

    fn description(&self) -> &str {
        "Generate a meeting room report (room_utilization or a general count summary)."
    }

    fn input_schema(&self) -> Value {
        json_schema(json!({"report_type": {"type": "string"}}), vec![])
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let report_type = input
            .get("report_type")
            .and_then(|v| v.as_str())
            .unwrap_or("utilization")
            .to_string();
        let content = self.store.report(&report_type).await;
        Ok(ToolOutcome::success("Meeting report generated successfully")
            .with("report_id", generate_id("RPT"))
            .with("report_type", report_type)
            .with("content", content)
            .with("generated_at", Utc::now().to_rfc3339()))
    }
}

pub fn registry(store: Arc<MeetingStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BookMeetingRoomTool::new(store.clone())));
    registry.register(Arc::new(CheckRoomAvailabilityTool));
    registry.register(Arc::new(CancelBookingTool::new(store.clone())));
    registry.register(Arc::new(GenerateMeetingReportTool::new(store)));
    registry
}

/// Room named in the message, by id or by name; the first room otherwise
fn room_id(ctx: &RequestContext) -> &'static str {
    let ids: Vec<&'static str> = ROOMS.iter().map(|r| r.room_id).collect();
    if let Some(id) = find_known(&ctx.user_message, &ids) {
        return id;
    }
    let names: Vec<&'static str> = ROOMS.iter().map(|r| r.name).collect();
    find_known(&ctx.user_message, &names)
        .and_then(|name| ROOMS.iter().find(|r| r.name == name))
        .map(|r| r.room_id)
        .unwrap_or(ROOMS[0].room_id)
}

pub fn planner() -> KeywordToolPlanner {
    KeywordToolPlanner::new(vec![
        ToolRule::new(
            "book_meeting_room",
            &["book", "reserve", "schedule meeting", "room booking"],
            |ctx| {
                let date = relative_date(&ctx.user_message, 0);
                json!({
                    "room_id": room_id(ctx),
                    "meeting_title": "Team Meeting",
                    "organizer": ctx.user_id,
                    "start_time": format!("{}T09:00:00", date),
                    "end_time": format!("{}T10:00:00", date),
                })
            },
        ),
        ToolRule::new(
            "check_room_availability",
            &["availability", "check", "available", "free"],
            |ctx| {
                json!({
                    "room_id": room_id(ctx),
                    "date": relative_date(&ctx.user_message, 0),
                })
            },
        ),
        ToolRule::new("cancel_booking", &["cancel", "delete", "remove booking"], |ctx| {
            json!({
                "booking_id": token_or_fallback(ctx, "BOOK_"),
                "cancelled_by": ctx.user_id,
            })
        }),
        ToolRule::new(
            "generate_meeting_report",
            &["report", "summary", "meeting stats"],
            |_| json!({"report_type": "room_utilization"}),
        ),
    ])
}
