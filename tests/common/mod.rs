#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;

pub const HEADER: &str = "brand,model,top_speed_kmh,battery_capacity_kWh,battery_type,number_of_cells,torque_nm,efficiency_wh_per_km,range_km,acceleration_0_100_s,fast_charging_power_kw_dc,fast_charge_port,towing_capacity_kg,cargo_volume_l,seats,drivetrain,segment,length_mm,width_mm,height_mm,car_body_type,source_url";

/// Four vehicles, three brands, two segments, two body types.
pub const SAMPLE: &str = "\
Tesla,Model 3,225,75.0,Lithium-ion,4680,450,150,500,5.1,170,CCS,0,425,5,RWD,C - Medium,4694,1849,1443,Sedan,https://example.com/tesla-model-3
Tesla,Model Y,225,75.0,Lithium-ion,4680,450,160,480,5.8,170,CCS,1600,425,5,RWD,JC - Medium,4751,1921,1624,SUV,https://example.com/tesla-model-y
BMW,i4,200,81.5,Lithium-ion,4680,400,170,450,5.5,200,CCS,0,495,5,RWD,C - Medium,4783,1852,1454,Sedan,https://example.com/bmw-i4
Audi,e-tron,200,100.0,Lithium-ion,4680,450,180,500,5.2,150,CCS,1800,660,5,AWD,JC - Medium,4901,1935,1616,SUV,https://example.com/audi-etron
";

pub fn csv_with(rows: &str) -> String {
    format!("{HEADER}\n{rows}")
}

/// A row with only the columns the KPIs look at filled in.
pub fn row(brand: &str, segment: &str, range: &str, body: &str) -> String {
    format!(
        "{brand},M,,,,,,,{range},,,,,,,,{segment},,,,{body},\n"
    )
}

pub fn write_csv(contents: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(tmp, "{contents}").unwrap();
    tmp
}

/// Parquet file with every column stored as text, the way a loosely typed
/// export would write it. `rows` are CSV lines without quoting.
pub fn write_text_parquet(rows: &str) -> NamedTempFile {
    let names: Vec<&str> = HEADER.split(',').collect();
    let lines: Vec<Vec<&str>> = rows.lines().map(|l| l.split(',').collect()).collect();

    let fields: Vec<Field> = names
        .iter()
        .map(|n| Field::new(*n, DataType::Utf8, true))
        .collect();
    let columns: Vec<ArrayRef> = (0..names.len())
        .map(|i| {
            let values: StringArray = lines.iter().map(|l| l.get(i).copied()).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

    let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer = ArrowWriter::try_new(tmp.reopen().unwrap(), batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    tmp
}
