//! HR tools: employee records, training, certifications and reports

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    StoreError, ToolHandler, ToolOutcome, ToolRegistry, generate_id, json_schema, parse_input,
};
use crate::planner::{
    KeywordToolPlanner, ToolRule, find_token, relative_date, today, token_or_fallback,
};
use crate::types::RequestContext;

/// Departments an employee record may belong to
pub const VALID_DEPARTMENTS: &[&str] = &[
    "Flight Operations",
    "Maintenance",
    "Ground Services",
    "Air Traffic Control",
    "Safety & Security",
    "Customer Service",
    "Cargo Operations",
    "Engineering",
    "Quality Assurance",
    "Training",
    "Human Resources",
    "Finance",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub department: String,
    pub hire_date: String,
    pub certifications: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Training {
    pub training_id: String,
    pub employee_id: String,
    pub training_type: String,
    pub scheduled_date: String,
    pub instructor: String,
    pub duration_hours: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certification {
    pub certification_id: String,
    pub employee_id: String,
    pub certification_type: String,
    pub certification_number: String,
    pub issue_date: String,
    pub expiry_date: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewEmployee {
    #[serde(default)]
    pub employee_id: Option<String>,
    pub name: String,
    pub position: String,
    pub department: String,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrainingRequest {
    pub employee_id: String,
    pub training_type: String,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u32,
}

fn default_duration_hours() -> u32 {
    8
}

#[derive(Debug, Deserialize)]
pub struct CertificationRequest {
    pub employee_id: String,
    pub certification_type: String,
    #[serde(default)]
    pub certification_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default)]
struct HrState {
    employees: HashMap<String, Employee>,
    trainings: HashMap<String, Vec<Training>>,
    certifications: HashMap<String, Vec<Certification>>,
}

/// In-memory HR records, owned by the HR tools
#[derive(Debug, Default)]
pub struct HrStore {
    state: Mutex<HrState>,
}

fn check_date(field: &str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        StoreError::Invalid(format!("Invalid {} '{}', expected YYYY-MM-DD", field, value))
    })
}

impl HrStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        if !VALID_DEPARTMENTS.contains(&new.department.as_str()) {
            return Err(StoreError::Invalid(format!(
                "Unknown department '{}'. Valid departments: {}",
                new.department,
                VALID_DEPARTMENTS.join(", ")
            )));
        }
        let hire_date = new.hire_date.unwrap_or_else(|| today().format(DATE_FORMAT).to_string());
        check_date("hire_date", &hire_date)?;

        let employee = Employee {
            employee_id: new.employee_id.unwrap_or_else(|| generate_id("EMP")),
            name: new.name,
            position: new.position,
            department: new.department,
            hire_date,
            certifications: new.certifications,
            status: "active".to_string(),
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state
            .employees
            .insert(employee.employee_id.clone(), employee.clone());
        info!("Created employee record: {}", employee.employee_id);
        Ok(employee)
    }

    pub async fn schedule_training(&self, req: TrainingRequest) -> Result<Training, StoreError> {
        let scheduled_date = req
            .scheduled_date
            .unwrap_or_else(|| today().format(DATE_FORMAT).to_string());
        check_date("scheduled_date", &scheduled_date)?;
        if req.duration_hours == 0 {
            return Err(StoreError::Invalid("duration_hours must be at least 1".to_string()));
        }

        let training = Training {
            training_id: generate_id("TRN"),
            employee_id: req.employee_id,
            training_type: req.training_type,
            scheduled_date,
            instructor: req.instructor.unwrap_or_else(|| "TBD".to_string()),
            duration_hours: req.duration_hours,
            status: "scheduled".to_string(),
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state
            .trainings
            .entry(training.employee_id.clone())
            .or_default()
            .push(training.clone());
        info!("Scheduled training: {}", training.training_id);
        Ok(training)
    }

    pub async fn track_certification(
        &self,
        req: CertificationRequest,
    ) -> Result<Certification, StoreError> {
        let issue_date = req
            .issue_date
            .unwrap_or_else(|| today().format(DATE_FORMAT).to_string());
        let issued = check_date("issue_date", &issue_date)?;
        if let Some(expiry) = &req.expiry_date {
            if check_date("expiry_date", expiry)? < issued {
                return Err(StoreError::Invalid(
                    "expiry_date cannot be before issue_date".to_string(),
                ));
            }
        }

        let certification = Certification {
            certification_id: generate_id("CERT"),
            employee_id: req.employee_id,
            certification_type: req.certification_type,
            certification_number: req.certification_number.unwrap_or_default(),
            issue_date,
            expiry_date: req.expiry_date,
            status: req.status.unwrap_or_else(|| "active".to_string()),
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state
            .certifications
            .entry(certification.employee_id.clone())
            .or_default()
            .push(certification.clone());
        info!("Tracked certification: {}", certification.certification_id);
        Ok(certification)
    }

    /// Report content for `report_type`; `employee_summary` has its own shape
    pub async fn report(&self, report_type: &str) -> Value {
        let state = self.state.lock().await;
        if report_type == "employee_summary" {
            let cutoff = today() - Duration::days(30);
            let departments: BTreeSet<&str> = state
                .employees
                .values()
                .map(|e| e.department.as_str())
                .collect();
            let recent_hires: Vec<&Employee> = state
                .employees
                .values()
                .filter(|e| {
                    NaiveDate::parse_from_str(&e.hire_date, DATE_FORMAT)
                        .map(|d| d > cutoff)
                        .unwrap_or(false)
                })
                .collect();
            let active = state
                .employees
                .values()
                .filter(|e| e.status == "active")
                .count();
            json!({
                "total_employees": state.employees.len(),
                "active_employees": active,
                "departments": departments,
                "recent_hires": recent_hires,
            })
        } else {
            json!({
                "employees": state.employees.len(),
                "certifications": state.certifications.values().map(Vec::len).sum::<usize>(),
                "trainings": state.trainings.values().map(Vec::len).sum::<usize>(),
            })
        }
    }

    pub async fn employee(&self, employee_id: &str) -> Option<Employee> {
        self.state.lock().await.employees.get(employee_id).cloned()
    }

    pub async fn trainings_for(&self, employee_id: &str) -> Vec<Training> {
        self.state
            .lock()
            .await
            .trainings
            .get(employee_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Create an employee record
pub struct CreateEmployeeRecordTool {
    store: Arc<HrStore>,
}

impl CreateEmployeeRecordTool {
    pub fn new(store: Arc<HrStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for CreateEmployeeRecordTool {
    fn name(&self) -> &str {
        "create_employee_record"
    }

    fn description(&self) -> &str {
        "Create a new employee record for aviation personnel."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "employee_id": {"type": "string", "description": "Optional explicit id (EMP_...)"},
                "name": {"type": "string", "description": "Full name"},
                "position": {"type": "string", "description": "Job title"},
                "department": {"type": "string", "enum": VALID_DEPARTMENTS},
                "hire_date": {"type": "string", "description": "YYYY-MM-DD, defaults to today"},
                "certifications": {"type": "array", "items": {"type": "string"}}
            }),
            vec!["name", "position", "department"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: NewEmployee = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.create_employee(req).await {
            Ok(employee) => Ok(ToolOutcome::success(format!(
                "Employee {} created successfully",
                employee.name
            ))
            .with("employee_id", employee.employee_id.clone())
            .with("details", serde_json::to_value(&employee)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Schedule a training session
pub struct ScheduleTrainingTool {
    store: Arc<HrStore>,
}

impl ScheduleTrainingTool {
    pub fn new(store: Arc<HrStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for ScheduleTrainingTool {
    fn name(&self) -> &str {
        "schedule_training"
    }

    fn description(&self) -> &str {
        "Schedule training for aviation personnel."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "employee_id": {"type": "string"},
                "training_type": {
                    "type": "string",
                    "description": "e.g. Safety Training, CRM Recurrent"
                },
                "scheduled_date": {"type": "string", "description": "YYYY-MM-DD"},
                "instructor": {"type": "string"},
                "duration_hours": {"type": "integer", "minimum": 1}
            }),
            vec!["employee_id", "training_type"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: TrainingRequest = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.schedule_training(req).await {
            Ok(training) => Ok(ToolOutcome::success(format!(
                "{} scheduled for {}",
                training.training_type, training.employee_id
            ))
            .with("training_id", training.training_id.clone())
            .with("details", serde_json::to_value(&training)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Record a certification for an employee
pub struct TrackCertificationTool {
    store: Arc<HrStore>,
}

impl TrackCertificationTool {
    pub fn new(store: Arc<HrStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for TrackCertificationTool {
    fn name(&self) -> &str {
        "track_certification"
    }

    fn description(&self) -> &str {
        "Track a license or certification held by an employee, including expiry."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "employee_id": {"type": "string"},
                "certification_type": {"type": "string"},
                "certification_number": {"type": "string"},
                "issue_date": {"type": "string", "description": "YYYY-MM-DD"},
                "expiry_date": {"type": "string", "description": "YYYY-MM-DD"},
                "status": {"type": "string"}
            }),
            vec!["employee_id", "certification_type"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: CertificationRequest = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.track_certification(req).await {
            Ok(cert) => Ok(ToolOutcome::success("Certification tracked successfully")
                .with("certification_id", cert.certification_id.clone())
                .with("details", serde_json::to_value(&cert)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Generate an HR report
pub struct GenerateHrReportTool {
    store: Arc<HrStore>,
}

impl GenerateHrReportTool {
    pub fn new(store: Arc<HrStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GenerateHrReportTool {
    fn name(&self) -> &str {
        "generate_hr_report"
    }

    fn description(&self) -> &str {
        "Generate an HR report (employee_summary or a general count summary)."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "report_type": {"type": "string", "description": "employee_summary or summary"}
            }),
            vec![],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let report_type = input
            .get("report_type")
            .and_then(|v| v.as_str())
            .unwrap_or("summary")
            .to_string();
        debug!("Generating HR report: {}", report_type);
        let content = self.store.report(&report_type).await;
        Ok(ToolOutcome::success("HR report generated successfully")
            .with("report_id", generate_id("RPT"))
            .with("report_type", report_type)
            .with("content", content)
            .with("generated_at", Utc::now().to_rfc3339()))
    }
}

/// All HR tools over one shared store
pub fn registry(store: Arc<HrStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CreateEmployeeRecordTool::new(store.clone())));
    registry.register(Arc::new(ScheduleTrainingTool::new(store.clone())));
    registry.register(Arc::new(TrackCertificationTool::new(store.clone())));
    registry.register(Arc::new(GenerateHrReportTool::new(store)));
    registry
}

fn employee_id(ctx: &RequestContext) -> String {
    token_or_fallback(ctx, "EMP_")
}

/// Keyword rules mapping HR requests to tool calls
pub fn planner() -> KeywordToolPlanner {
    KeywordToolPlanner::new(vec![
        ToolRule::new(
            "create_employee_record",
            &["create employee", "add employee", "new hire", "onboard"],
            |ctx| {
                json!({
                    "employee_id": find_token(&ctx.user_message, "EMP_"),
                    "name": "New Hire",
                    "position": "Aviation Specialist",
                    "department": "Flight Operations",
                    "hire_date": relative_date(&ctx.user_message, 0),
                })
            },
        ),
        ToolRule::new("schedule_training", &["training", "schedule", "course"], |ctx| {
            json!({
                "employee_id": employee_id(ctx),
                "training_type": "Safety Training",
                "scheduled_date": relative_date(&ctx.user_message, 7),
                "duration_hours": 8,
            })
        }),
        ToolRule::new(
            "track_certification",
            &["certification", "license", "track", "expiry"],
            |ctx| {
                json!({
                    "employee_id": employee_id(ctx),
                    "certification_type": "Pilot License",
                    "issue_date": relative_date(&ctx.user_message, 0),
                })
            },
        ),
        ToolRule::new("generate_hr_report", &["report", "generate", "summary"], |_| {
            json!({"report_type": "employee_summary"})
        }),
    ])
}
