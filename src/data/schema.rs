use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

// ---------------------------------------------------------------------------
// Column table for the vehicle specification file
// ---------------------------------------------------------------------------

/// Logical type of a column, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Decimal,
    Integer,
}

impl ColumnType {
    pub fn data_type(self) -> DataType {
        match self {
            ColumnType::Text => DataType::Utf8,
            ColumnType::Decimal => DataType::Float64,
            ColumnType::Integer => DataType::Int64,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnType::Text)
    }
}

pub const BRAND: &str = "brand";
pub const MODEL: &str = "model";
pub const BATTERY_CAPACITY: &str = "battery_capacity_kWh";
pub const EFFICIENCY: &str = "efficiency_wh_per_km";
pub const RANGE: &str = "range_km";
pub const ACCELERATION: &str = "acceleration_0_100_s";
pub const SEGMENT: &str = "segment";
pub const BODY_TYPE: &str = "car_body_type";

/// Every column of the file, in file order.
pub const COLUMNS: [(&str, ColumnType); 22] = [
    (BRAND, ColumnType::Text),
    (MODEL, ColumnType::Text),
    ("top_speed_kmh", ColumnType::Decimal),
    (BATTERY_CAPACITY, ColumnType::Decimal),
    ("battery_type", ColumnType::Text),
    ("number_of_cells", ColumnType::Integer),
    ("torque_nm", ColumnType::Decimal),
    (EFFICIENCY, ColumnType::Decimal),
    (RANGE, ColumnType::Decimal),
    (ACCELERATION, ColumnType::Decimal),
    ("fast_charging_power_kw_dc", ColumnType::Decimal),
    ("fast_charge_port", ColumnType::Text),
    ("towing_capacity_kg", ColumnType::Decimal),
    ("cargo_volume_l", ColumnType::Decimal),
    ("seats", ColumnType::Integer),
    ("drivetrain", ColumnType::Text),
    (SEGMENT, ColumnType::Text),
    ("length_mm", ColumnType::Decimal),
    ("width_mm", ColumnType::Decimal),
    ("height_mm", ColumnType::Decimal),
    (BODY_TYPE, ColumnType::Text),
    ("source_url", ColumnType::Text),
];

/// Rows missing any of these are not vehicles we can chart and get skipped.
pub const KEY_COLUMNS: [&str; 4] = [BRAND, MODEL, SEGMENT, BODY_TYPE];

/// Arrow schema of the loaded table. Every field is nullable.
pub fn arrow_schema() -> SchemaRef {
    let fields: Vec<Field> = COLUMNS
        .iter()
        .map(|(name, ty)| Field::new(*name, ty.data_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
}
