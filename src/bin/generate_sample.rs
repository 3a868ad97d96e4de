use std::path::PathBuf;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use ev_dashboard::data::loader::{self, LoadOptions};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One CSV row; field names follow the file header.
#[derive(Serialize)]
struct Vehicle {
    brand: String,
    model: String,
    top_speed_kmh: u32,
    #[serde(rename = "battery_capacity_kWh")]
    battery_capacity_kwh: f64,
    battery_type: &'static str,
    number_of_cells: Option<u32>,
    torque_nm: Option<u32>,
    efficiency_wh_per_km: u32,
    range_km: u32,
    acceleration_0_100_s: f64,
    fast_charging_power_kw_dc: Option<u32>,
    fast_charge_port: &'static str,
    towing_capacity_kg: Option<u32>,
    cargo_volume_l: Option<u32>,
    seats: u32,
    drivetrain: &'static str,
    segment: &'static str,
    length_mm: u32,
    width_mm: u32,
    height_mm: u32,
    car_body_type: &'static str,
    source_url: String,
}

/// (segment, body types, battery kWh range, base efficiency)
const SEGMENTS: [(&str, &[&str], (f64, f64), f64); 5] = [
    ("B - Compact", &["Hatchback", "Small Passenger Van"], (35.0, 55.0), 140.0),
    ("C - Medium", &["Hatchback", "SUV", "Sedan"], (50.0, 80.0), 155.0),
    ("D - Large", &["SUV", "Sedan", "Station/Estate"], (70.0, 95.0), 170.0),
    ("E - Executive", &["Sedan", "SUV", "Liftback Sedan"], (80.0, 110.0), 185.0),
    ("F - Luxury", &["SUV", "Sedan", "Coupe"], (95.0, 120.0), 210.0),
];

const BRANDS: [&str; 10] = [
    "Audi", "BMW", "BYD", "Hyundai", "Kia", "Mercedes-Benz", "Peugeot", "Polestar", "Tesla",
    "Volkswagen",
];

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Vehicle> {
    (0..n)
        .map(|i| {
            let brand = *rng.pick(&BRANDS);
            let (segment, bodies, (kwh_lo, kwh_hi), base_eff) = *rng.pick(&SEGMENTS);
            let battery = (rng.uniform(kwh_lo, kwh_hi) * 10.0).round() / 10.0;
            let efficiency = (base_eff + rng.uniform(-15.0, 25.0)).round();
            let range = (battery * 1000.0 / efficiency * 0.95 / 5.0).round() * 5.0;
            let awd = rng.next_f64() < 0.4;
            let length = 4000.0 + rng.uniform(0.0, 1200.0);

            Vehicle {
                brand: brand.to_string(),
                model: format!("EV{:02}", i % 97),
                top_speed_kmh: rng.uniform(150.0, 260.0) as u32,
                battery_capacity_kwh: battery,
                battery_type: "Lithium-ion",
                number_of_cells: (rng.next_f64() < 0.7).then(|| rng.uniform(96.0, 7000.0) as u32),
                torque_nm: (rng.next_f64() < 0.95).then(|| rng.uniform(250.0, 900.0) as u32),
                efficiency_wh_per_km: efficiency as u32,
                range_km: range as u32,
                acceleration_0_100_s: (rng.uniform(3.0, 10.5) * 10.0).round() / 10.0,
                fast_charging_power_kw_dc: (rng.next_f64() < 0.98)
                    .then(|| rng.uniform(50.0, 270.0) as u32),
                fast_charge_port: "CCS",
                towing_capacity_kg: (rng.next_f64() < 0.8).then(|| rng.uniform(0.0, 2500.0) as u32),
                cargo_volume_l: (rng.next_f64() < 0.9).then(|| rng.uniform(250.0, 700.0) as u32),
                seats: *rng.pick(&[4, 5, 5, 5, 7]),
                drivetrain: if awd { "AWD" } else { *rng.pick(&["FWD", "RWD"]) },
                segment,
                length_mm: length as u32,
                width_mm: rng.uniform(1750.0, 2000.0) as u32,
                height_mm: rng.uniform(1400.0, 1750.0) as u32,
                car_body_type: *rng.pick(bodies),
                source_url: format!("https://example.com/{}/{i}", brand.to_lowercase()),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let csv_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("electric_vehicles_sample.csv"));

    let mut rng = SimpleRng::new(42);
    let vehicles = generate(&mut rng, 250);

    // Write CSV
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    for v in &vehicles {
        writer.serialize(v).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;

    // Write Parquet from the validated table
    let bytes = std::fs::read(&csv_path).context("re-reading CSV")?;
    let outcome = loader::load_csv_bytes(&bytes, LoadOptions::default())?;
    let parquet_path = csv_path.with_extension("parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, outcome.table.schema(), None)
        .context("creating parquet writer")?;
    writer.write(&outcome.table).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    let preview = outcome.table.slice(0, outcome.table.num_rows().min(5));
    println!("{}", pretty_format_batches(&[preview]).context("formatting preview")?);
    println!(
        "Wrote {} vehicles to {} and {}",
        outcome.report.records,
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
