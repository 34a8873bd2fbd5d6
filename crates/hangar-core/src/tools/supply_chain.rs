//! Supply chain tools: inventory, parts orders, suppliers and stock reports

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::{
    StoreError, ToolHandler, ToolOutcome, ToolRegistry, generate_id, json_schema, parse_input,
};
use crate::planner::{KeywordToolPlanner, ToolRule, find_known, find_quantity, find_token, today};
use crate::types::RequestContext;

/// Mock unit price used for order estimates
pub const UNIT_COST: u64 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub name: String,
    pub category: String,
    pub current_stock: u32,
    pub min_stock: u32,
}

impl InventoryItem {
    fn new(name: &str, category: &str, current_stock: u32, min_stock: u32) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            current_stock,
            min_stock,
        }
    }

    pub fn is_low(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub name: String,
    pub status: String,
    pub rating: String,
    pub location: String,
}

impl Supplier {
    fn new(name: &str, status: &str, rating: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            status: status.to_string(),
            rating: rating.to_string(),
            location: location.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartsOrder {
    pub order_id: String,
    pub part_number: String,
    pub part_name: String,
    pub quantity: u32,
    pub supplier_id: String,
    pub supplier_name: String,
    pub priority: String,
    pub delivery_date: String,
    pub cost_center: String,
    pub estimated_cost: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub part_number: String,
    pub quantity: i64,
    pub supplier_id: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
}

#[derive(Debug)]
struct SupplyState {
    inventory: BTreeMap<String, InventoryItem>,
    suppliers: BTreeMap<String, Supplier>,
    orders: HashMap<String, PartsOrder>,
}

/// In-memory inventory, suppliers and orders, owned by the supply chain tools
#[derive(Debug)]
pub struct SupplyChainStore {
    state: Mutex<SupplyState>,
}

impl Default for SupplyChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SupplyChainStore {
    /// A store seeded with the standard parts catalogue and supplier list
    pub fn new() -> Self {
        let inventory = [
            ("ENG_PART_001", InventoryItem::new("Turbine Blade Set", "Engine", 15, 5)),
            ("LAND_GEAR_01", InventoryItem::new("Landing Gear Assembly", "Landing System", 3, 2)),
            ("AVIONICS_A1", InventoryItem::new("Navigation Computer", "Avionics", 8, 3)),
            ("HYDRAULIC_P1", InventoryItem::new("Hydraulic Pump", "Hydraulics", 12, 4)),
            ("BRAKE_DISC_1", InventoryItem::new("Carbon Brake Disc", "Braking System", 20, 8)),
        ]
        .into_iter()
        .map(|(id, item)| (id.to_string(), item))
        .collect();

        let suppliers = [
            ("SUP_001", Supplier::new("AeroTech Industries", "active", "A", "Seattle, WA")),
            ("SUP_002", Supplier::new("Aviation Parts Direct", "active", "B+", "Miami, FL")),
            ("SUP_003", Supplier::new("Global Aviation Supply", "pending", "A-", "Dallas, TX")),
        ]
        .into_iter()
        .map(|(id, s)| (id.to_string(), s))
        .collect();

        Self::with_catalog(inventory, suppliers)
    }

    pub fn with_catalog(
        inventory: BTreeMap<String, InventoryItem>,
        suppliers: BTreeMap<String, Supplier>,
    ) -> Self {
        Self {
            state: Mutex::new(SupplyState {
                inventory,
                suppliers,
                orders: HashMap::new(),
            }),
        }
    }

    /// Stock line for one part, or `None` if unknown
    pub async fn stock(&self, part_number: &str) -> Option<InventoryItem> {
        self.state.lock().await.inventory.get(part_number).cloned()
    }

    pub async fn set_stock(&self, part_number: &str, current_stock: u32) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let item = state
            .inventory
            .get_mut(part_number)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Part",
                id: part_number.to_string(),
            })?;
        item.current_stock = current_stock;
        Ok(())
    }

    pub async fn order(&self, req: OrderRequest) -> Result<PartsOrder, StoreError> {
        if req.quantity < 1 {
            return Err(StoreError::Invalid(format!(
                "quantity must be at least 1, got {}",
                req.quantity
            )));
        }
        let quantity = u32::try_from(req.quantity)
            .map_err(|_| StoreError::Invalid(format!("quantity {} is too large", req.quantity)))?;

        let mut state = self.state.lock().await;
        let part_name = state
            .inventory
            .get(&req.part_number)
            .map(|i| i.name.clone())
            .ok_or_else(|| StoreError::NotFound {
                kind: "Part",
                id: req.part_number.clone(),
            })?;
        let supplier = state
            .suppliers
            .get(&req.supplier_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Supplier",
                id: req.supplier_id.clone(),
            })?;
        let supplier_name = supplier.name.clone();

        let order = PartsOrder {
            order_id: generate_id("ORDER"),
            part_number: req.part_number,
            part_name,
            quantity,
            supplier_id: req.supplier_id,
            supplier_name,
            priority: req.priority.unwrap_or_else(|| "normal".to_string()),
            delivery_date: req.delivery_date.unwrap_or_else(|| {
                (today() + Duration::days(7)).format("%Y-%m-%d").to_string()
            }),
            cost_center: req.cost_center.unwrap_or_else(|| "Maintenance".to_string()),
            estimated_cost: u64::from(quantity) * UNIT_COST,
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        state.orders.insert(order.order_id.clone(), order.clone());
        info!("Placed order {} for {} x {}", order.order_id, order.quantity, order.part_number);
        Ok(order)
    }

    fn stock_line(part_number: &str, item: &InventoryItem, location: &str) -> Value {
        json!({
            "part_number": part_number,
            "part_name": item.name,
            "category": item.category,
            "current_stock": item.current_stock,
            "minimum_stock": item.min_stock,
            "location": location,
            "stock_status": if item.is_low() { "low" } else { "normal" },
            "reorder_needed": item.is_low(),
        })
    }

    /// Stock details for one part, or every part when `part_number` is `None`
    pub async fn track(&self, part_number: Option<&str>, location: &str) -> Value {
        let state = self.state.lock().await;
        match part_number {
            Some(pn) => match state.inventory.get(pn) {
                Some(item) => Self::stock_line(pn, item, location),
                None => json!({
                    "part_number": pn,
                    "status": "not_found",
                    "message": format!("Part {} not found in inventory", pn),
                }),
            },
            None => Value::Array(
                state
                    .inventory
                    .iter()
                    .map(|(pn, item)| Self::stock_line(pn, item, location))
                    .collect(),
            ),
        }
    }

    fn supplier_line(state: &SupplyState, supplier_id: &str, supplier: &Supplier) -> Value {
        let active_orders = state
            .orders
            .values()
            .filter(|o| o.supplier_id == supplier_id)
            .count();
        json!({
            "supplier_id": supplier_id,
            "supplier_name": supplier.name,
            "status": supplier.status,
            "rating": supplier.rating,
            "location": supplier.location,
            "active_orders": active_orders,
            "last_delivery": "2024-01-15",
            "on_time_performance": "92%",
        })
    }

    /// Status for one supplier, or every supplier when `supplier_id` is `None`
    pub async fn supplier_status(&self, supplier_id: Option<&str>) -> Value {
        let state = self.state.lock().await;
        match supplier_id {
            Some(id) => match state.suppliers.get(id) {
                Some(s) => Self::supplier_line(&state, id, s),
                None => json!({
                    "supplier_id": id,
                    "status": "not_found",
                    "message": format!("Supplier {} not found", id),
                }),
            },
            None => Value::Array(
                state
                    .suppliers
                    .iter()
                    .map(|(id, s)| Self::supplier_line(&state, id, s))
                    .collect(),
            ),
        }
    }

    pub async fn report(&self, report_type: &str) -> Value {
        let state = self.state.lock().await;
        if report_type == "low_stock_alert" {
            let low: Vec<Value> = state
                .inventory
                .iter()
                .filter(|(_, item)| item.is_low())
                .map(|(pn, item)| {
                    json!({
                        "part_number": pn,
                        "name": item.name,
                        "current_stock": item.current_stock,
                        "minimum_stock": item.min_stock,
                        "shortage": i64::from(item.min_stock) - i64::from(item.current_stock),
                    })
                })
                .collect();
            json!({
                "total_parts": state.inventory.len(),
                "low_stock_count": low.len(),
                "low_stock_items": low,
                "total_orders": state.orders.len(),
                "pending_orders": state.orders.values().filter(|o| o.status == "pending").count(),
            })
        } else {
            json!({
                "inventory_items": state.inventory.len(),
                "suppliers": state.suppliers.len(),
                "orders": state.orders.len(),
            })
        }
    }
}

/// Report stock levels
pub struct TrackInventoryTool {
    store: Arc<SupplyChainStore>,
}

impl TrackInventoryTool {
    pub fn new(store: Arc<SupplyChainStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for TrackInventoryTool {
    fn name(&self) -> &str {
        "track_inventory"
    }

    fn description(&self) -> &str {
        "Track stock levels for one aircraft part, or for all parts when no part number is given."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "part_number": {"type": "string"},
                "location": {"type": "string", "description": "Defaults to Main Warehouse"}
            }),
            vec![],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        #[derive(Deserialize)]
        struct Input {
            #[serde(default)]
            part_number: Option<String>,
            #[serde(default)]
            location: Option<String>,
        }
        let req: Input = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        let location = req.location.as_deref().unwrap_or("Main Warehouse");
        let details = self.store.track(req.part_number.as_deref(), location).await;
        let message = match &req.part_number {
            Some(pn) => format!("Inventory tracked for part {}", pn),
            None => "Inventory tracked for all parts".to_string(),
        };
        Ok(ToolOutcome::success(message).with("details", details))
    }
}

/// Place a parts order with a supplier
pub struct OrderPartsTool {
    store: Arc<SupplyChainStore>,
}

impl OrderPartsTool {
    pub fn new(store: Arc<SupplyChainStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for OrderPartsTool {
    fn name(&self) -> &str {
        "order_parts"
    }

    fn description(&self) -> &str {
        "Order aircraft parts from a supplier. Cost is estimated per unit."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            json!({
                "part_number": {"type": "string"},
                "quantity": {"type": "integer", "minimum": 1},
                "supplier_id": {"type": "string"},
                "priority": {"type": "string", "enum": ["normal", "urgent", "aog"]},
                "delivery_date": {"type": "string", "description": "YYYY-MM-DD"},
                "cost_center": {"type": "string"}
            }),
            vec!["part_number", "quantity", "supplier_id"],
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let req: OrderRequest = match parse_input(self.name(), input) {
            Ok(req) => req,
            Err(outcome) => return Ok(outcome),
        };
        match self.store.order(req).await {
            Ok(order) => Ok(ToolOutcome::success("Order placed successfully")
                .with("order_id", order.order_id.clone())
                .with("details", serde_json::to_value(&order)?)),
            Err(e) => Ok(e.into()),
        }
    }
}

/// Look up supplier standing
pub struct CheckSupplierStatusTool {
    store: Arc<SupplyChainStore>,
}

impl CheckSupplierStatusTool {
    pub fn new(store: Arc<SupplyChainStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for CheckSupplierStatusTool {
    fn name(&self) -> &str {
        "check_supplier_status"
    }

    fn description(&self) -> &str {
        "Check a supplier's status, rating and open orders, or list all suppliers."
    }

    fn input_schema(&self) -> Value {
        json_schema(json!({"supplier_id": {"type": "string"}}), vec![])
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let supplier_id = input.get("supplier_id").and_then(|v| v.as_str());
        let details = self.store.supplier_status(supplier_id).await;
        let message = match supplier_id {
            Some(id) => format!("Supplier status checked for {}", id),
            None => "Supplier status checked for all suppliers".to_string(),
        };
        Ok(ToolOutcome::success(message).with("details", details))
    }
}

/// Summarize stock health and orders
pub struct GenerateInventoryReportTool {
    store: Arc<SupplyChainStore>,
}

impl GenerateInventoryReportTool {
    pub fn new(store: Arc<SupplyChainStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for GenerateInventoryReportTool {
    fn name(&self) -> &str {
        "generate_inventory_report"
    }

    fn description(&self) -> &str {
        "Generate a supply chain report (low_stock_alert or a general count summary)."
    }

    fn input_schema(&self) -> Value {
        json_schema(json!({"report_type": {"type": "string"}}), vec![])
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let report_type = input
            .get("report_type")
            .and_then(|v| v.as_str())
            .unwrap_or("low_stock_alert")
            .to_string();
        let content = self.store.report(&report_type).await;
        Ok(ToolOutcome::success("Supply chain report generated successfully")
            .with("report_id", generate_id("RPT"))
            .with("report_type", report_type)
            .with("content", content)
            .with("generated_at", Utc::now().to_rfc3339()))
    }
}

pub fn registry(store: Arc<SupplyChainStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(TrackInventoryTool::new(store.clone())));
    registry.register(Arc::new(OrderPartsTool::new(store.clone())));
    registry.register(Arc::new(CheckSupplierStatusTool::new(store.clone())));
    registry.register(Arc::new(GenerateInventoryReportTool::new(store)));
    registry
}

const KNOWN_PARTS: &[&str] = &[
    "ENG_PART_001",
    "LAND_GEAR_01",
    "AVIONICS_A1",
    "HYDRAULIC_P1",
    "BRAKE_DISC_1",
];

pub fn planner() -> KeywordToolPlanner {
    KeywordToolPlanner::new(vec![
        ToolRule::new(
            "track_inventory",
            &["inventory", "stock", "check parts", "track"],
            |ctx| json!({"part_number": find_known(&ctx.user_message, KNOWN_PARTS)}),
        ),
        ToolRule::new(
            "order_parts",
            &["order", "purchase", "buy parts", "procurement"],
            |ctx: &RequestContext| {
                let lower = ctx.user_message.to_lowercase();
                let priority = if lower.contains("aog") {
                    "aog"
                } else if lower.contains("urgent") {
                    "urgent"
                } else {
                    "normal"
                };
                let part_number =
                    find_known(&ctx.user_message, KNOWN_PARTS).unwrap_or(KNOWN_PARTS[0]);
                let supplier_id = find_token(&ctx.user_message, "SUP_")
                    .unwrap_or_else(|| "SUP_001".to_string());
                json!({
                    "part_number": part_number,
                    "quantity": find_quantity(&ctx.user_message).unwrap_or(1),
                    "supplier_id": supplier_id,
                    "priority": priority,
                })
            },
        ),
        ToolRule::new(
            "check_supplier_status",
            &["supplier", "vendor", "check supplier"],
            |ctx| json!({"supplier_id": find_token(&ctx.user_message, "SUP_")}),
        ),
        ToolRule::new(
            "generate_inventory_report",
            &["report", "inventory report", "summary"],
            |_| json!({"report_type": "low_stock_alert"}),
        ),
    ])
}
