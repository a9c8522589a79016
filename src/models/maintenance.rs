//! Modelo de MaintenanceOrder
//! 
//! Órdenes de trabajo de taller contra un vehículo, independientes de los viajes.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

/// Estado de la orden - mapea al ENUM maintenance_state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceState {
    Scheduled,
    InProgress,
    Done,
}

impl MaintenanceState {
    pub fn is_open(self) -> bool {
        self != MaintenanceState::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceState::Scheduled => "scheduled",
            MaintenanceState::InProgress => "in_progress",
            MaintenanceState::Done => "done",
        }
    }
}

impl std::fmt::Display for MaintenanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MaintenanceOrder {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: Decimal,
    pub mechanic: Option<String>,
    pub state: MaintenanceState,
    pub service_date: NaiveDate,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenanceOrder {
    pub vehicle_id: Uuid,
    pub description: String,
    pub service_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub mechanic: Option<String>,
}

impl MaintenanceOrder {
    /// Sin fecha de servicio explícita se usa el día de apertura
    pub fn schedule(new: NewMaintenanceOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: new.vehicle_id,
            description: new.description,
            cost: new.cost.unwrap_or(Decimal::ZERO),
            mechanic: new.mechanic,
            state: MaintenanceState::Scheduled,
            service_date: new.service_date.unwrap_or_else(|| now.date_naive()),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Edición de campos de una orden abierta. Sin efectos sobre el vehículo.
#[derive(Debug, Clone, Default)]
pub struct MaintenancePatch {
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub mechanic: Option<String>,
    pub service_date: Option<NaiveDate>,
}

impl MaintenancePatch {
    pub fn apply(&self, order: &mut MaintenanceOrder) {
        if let Some(description) = &self.description {
            order.description = description.clone();
        }
        if let Some(cost) = self.cost {
            order.cost = cost;
        }
        if let Some(mechanic) = &self.mechanic {
            order.mechanic = Some(mechanic.clone());
        }
        if let Some(date) = self.service_date {
            order.service_date = date;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceFilters {
    pub vehicle_id: Option<Uuid>,
    pub state: Option<MaintenanceState>,
}

impl MaintenanceFilters {
    pub fn matches(&self, order: &MaintenanceOrder) -> bool {
        self.vehicle_id.map_or(true, |v| order.vehicle_id == v)
            && self.state.map_or(true, |s| order.state == s)
    }
}
