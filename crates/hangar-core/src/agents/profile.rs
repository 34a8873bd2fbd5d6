//! Domain profiles: identity, prompt and output tags for each domain agent

use serde::{Deserialize, Serialize};

use crate::types::Domain;

/// Everything that distinguishes one domain agent from another
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainProfile {
    pub domain: Domain,
    pub agent_name: String,
    /// Short label used in status messages and demo text ("HR", "supply chain")
    pub specialty: String,
    pub system_prompt: String,
    pub artifact_type: String,
    /// Heading of the tool actions section in merged responses
    pub actions_heading: String,
}

impl DomainProfile {
    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::Hr => Self::hr(),
            Domain::Meeting => Self::meeting(),
            Domain::SupplyChain => Self::supply_chain(),
        }
    }

    pub fn hr() -> Self {
        Self {
            domain: Domain::Hr,
            agent_name: "Aviation HR Agent".to_string(),
            specialty: "HR".to_string(),
            system_prompt: HR_PROMPT.to_string(),
            artifact_type: "hr_response".to_string(),
            actions_heading: "HR System Actions Performed".to_string(),
        }
    }

    pub fn meeting() -> Self {
        Self {
            domain: Domain::Meeting,
            agent_name: "Aviation Meeting Agent".to_string(),
            specialty: "meeting".to_string(),
            system_prompt: MEETING_PROMPT.to_string(),
            artifact_type: "meeting_response".to_string(),
            actions_heading: "Meeting System Actions Performed".to_string(),
        }
    }

    pub fn supply_chain() -> Self {
        Self {
            domain: Domain::SupplyChain,
            agent_name: "Aviation Supply Chain Agent".to_string(),
            specialty: "supply chain".to_string(),
            system_prompt: SUPPLY_CHAIN_PROMPT.to_string(),
            artifact_type: "supply_chain_response".to_string(),
            actions_heading: "Supply Chain System Actions Performed".to_string(),
        }
    }
}

const HR_PROMPT: &str = "You are an aviation HR specialist supporting airline and airport operators.

You handle:
- Employee records across flight operations, maintenance, ground services and ATC
- Licenses and certifications (pilot, mechanic, dispatcher, ATC) and their expiry
- Training and recurrency scheduling, including safety and crew resource management
- Compliance reporting against FAA, EASA and ICAO requirements

Tools available to you: create_employee_record, schedule_training, track_certification, \
generate_hr_report. Answer clearly and professionally.";

const MEETING_PROMPT: &str = "You are an aviation facilities coordinator managing meeting rooms \
at an operations base.

Rooms include the Flight Operations Center, Pilot Briefing Room, Executive Boardroom, \
Training Room A, the Maintenance Conference Room and the ATC Briefing Room.

You handle room bookings, availability checks, cancellations and utilization reporting, \
keeping briefings and safety meetings on schedule.

Tools available to you: book_meeting_room, check_room_availability, cancel_booking, \
generate_meeting_report. Answer clearly and professionally.";

const SUPPLY_CHAIN_PROMPT: &str = "You are an aviation supply chain specialist responsible for \
aircraft parts and suppliers.

You handle:
- Stock levels for engine, landing gear, avionics, hydraulic and braking parts
- Parts orders, including urgent and AOG (aircraft on ground) requests
- Supplier status, ratings and delivery performance
- Low-stock alerts and inventory reporting

Tools available to you: track_inventory, order_parts, check_supplier_status, \
generate_inventory_report. Answer clearly and professionally.";
