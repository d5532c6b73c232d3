//! `DuckDB` staging tables and their Parquet export.
//!
//! Rows are inserted into an in-memory `DuckDB` table inside one
//! transaction, then written out with `COPY ... (FORMAT PARQUET)`. The
//! table schema is derived from the cells of a blank row so the DDL and the
//! insert parameters can never disagree.

use std::borrow::Cow;
use std::path::Path;

use crash_map_crash_models::{CrashRecord, MergedRecord, VEHICLE_SLOTS, columns};
use crash_map_dimension::{DataModel, Dimension, FactRow};
use duckdb::types::Value;

use crate::ExportError;

/// Name of the wide output table.
pub const CRASHES_TABLE: &str = "crashes";

/// Name of the fact table in the dimensional model.
pub const FACT_TABLE: &str = "fact_crashes";

/// `(table, id column, description column)` of each dimension table.
pub const DIM_CONTRIBUTING_FACTORS: (&str, &str, &str) =
    ("dim_contributing_factors", "factor_id", "factor_description");
pub const DIM_VEHICLE_TYPES: (&str, &str, &str) = (
    "dim_vehicle_types",
    "vehicle_type_id",
    "vehicle_type_description",
);
pub const DIM_BOROUGHS: (&str, &str, &str) = ("dim_boroughs", "borough_id", "borough_name");

/// Column types used by the exported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Integer,
    BigInt,
    Double,
    Date,
    Time,
}

impl SqlType {
    #[must_use]
    pub const fn ddl(self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Date => "DATE",
            Self::Time => "TIME",
        }
    }

    /// Insert placeholder. Dates and times are bound as ISO text.
    const fn placeholder(self) -> &'static str {
        match self {
            Self::Date => "CAST(? AS DATE)",
            Self::Time => "CAST(? AS TIME)",
            _ => "?",
        }
    }
}

/// One column value of one row.
#[derive(Debug, Clone)]
pub struct Cell {
    pub name: Cow<'static, str>,
    pub sql_type: SqlType,
    pub value: Value,
}

impl Cell {
    fn new(name: impl Into<Cow<'static, str>>, sql_type: SqlType, value: Value) -> Self {
        Self {
            name: name.into(),
            sql_type,
            value,
        }
    }

    fn text(name: impl Into<Cow<'static, str>>, value: Option<&str>) -> Self {
        Self::new(
            name,
            SqlType::Varchar,
            value.map_or(Value::Null, |v| Value::Text(v.to_string())),
        )
    }

    fn count(name: impl Into<Cow<'static, str>>, value: Option<u32>) -> Self {
        Self::new(
            name,
            SqlType::BigInt,
            value.map_or(Value::Null, |v| Value::BigInt(i64::from(v))),
        )
    }

    fn double(name: &'static str, value: Option<f64>) -> Self {
        Self::new(name, SqlType::Double, value.map_or(Value::Null, Value::Double))
    }
}

/// Which shape of row to produce.
#[derive(Debug, Clone, Copy)]
enum Shape<'a> {
    /// Text categorical columns, as in the wide output table.
    Wide,
    /// Categorical columns replaced by dimension ids.
    Fact(&'a FactRow),
}

/// Cells of the columns shared by both shapes, up to and including the
/// street names.
fn leading_cells(crash: &CrashRecord, shape: Shape<'_>) -> Vec<Cell> {
    let mut cells = vec![
        Cell::text(columns::COLLISION_ID, Some(&crash.collision_id)),
        Cell::new(
            columns::CRASH_DATE,
            SqlType::Date,
            crash
                .crash_date
                .map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string())),
        ),
        Cell::new(
            columns::CRASH_TIME,
            SqlType::Time,
            crash
                .crash_time
                .map_or(Value::Null, |t| Value::Text(t.format("%H:%M:%S").to_string())),
        ),
        Cell::new(
            "crash_hour",
            SqlType::Integer,
            crash.crash_hour.map_or(Value::Null, Value::UInt),
        ),
        Cell::text("crash_day", crash.crash_day.as_deref()),
        Cell::text("crash_month", crash.crash_month.as_deref()),
        Cell::new(
            "crash_year",
            SqlType::Integer,
            crash.crash_year.map_or(Value::Null, Value::Int),
        ),
    ];

    match shape {
        Shape::Wide => {
            let borough = crash.borough.map(|b| b.to_string());
            cells.push(Cell::text(columns::BOROUGH, borough.as_deref()));
        }
        Shape::Fact(fact) => cells.push(Cell::count("borough_id", fact.borough_id)),
    }

    cells.extend([
        Cell::text(columns::ZIP_CODE, crash.zip_code.as_deref()),
        Cell::double(columns::LATITUDE, crash.latitude),
        Cell::double(columns::LONGITUDE, crash.longitude),
        Cell::text(columns::LOCATION, crash.location.as_deref()),
        Cell::text(columns::ON_STREET_NAME, crash.on_street_name.as_deref()),
        Cell::text(columns::CROSS_STREET_NAME, crash.cross_street_name.as_deref()),
        Cell::text(columns::OFF_STREET_NAME, crash.off_street_name.as_deref()),
    ]);
    cells
}

/// Every cell of one row, in column order.
fn row_cells(record: &MergedRecord, shape: Shape<'_>) -> Vec<Cell> {
    let crash = &record.crash;
    let mut cells = leading_cells(crash, shape);

    let c = &crash.casualties;
    cells.extend([
        Cell::count(columns::PERSONS_INJURED, c.persons_injured),
        Cell::count(columns::PERSONS_KILLED, c.persons_killed),
        Cell::count(columns::PEDESTRIANS_INJURED, c.pedestrians_injured),
        Cell::count(columns::PEDESTRIANS_KILLED, c.pedestrians_killed),
        Cell::count(columns::CYCLISTS_INJURED, c.cyclists_injured),
        Cell::count(columns::CYCLISTS_KILLED, c.cyclists_killed),
        Cell::count(columns::MOTORISTS_INJURED, c.motorists_injured),
        Cell::count(columns::MOTORISTS_KILLED, c.motorists_killed),
    ]);

    for slot in 0..VEHICLE_SLOTS {
        let factor = columns::contributing_factor(slot + 1);
        cells.push(match shape {
            Shape::Wide => Cell::text(factor, crash.contributing_factors[slot].as_deref()),
            Shape::Fact(fact) => Cell::count(
                format!("{factor}_id"),
                fact.contributing_factor_ids[slot],
            ),
        });
    }
    for slot in 0..VEHICLE_SLOTS {
        let vehicle = columns::vehicle_type(slot + 1);
        cells.push(match shape {
            Shape::Wide => Cell::text(vehicle, crash.vehicle_types[slot].as_deref()),
            Shape::Fact(fact) => {
                Cell::count(format!("{vehicle}_id"), fact.vehicle_type_ids[slot])
            }
        });
    }

    let metrics = crash.metrics;
    let severity = metrics.map(|m| m.severity.to_string());
    let location_type = metrics.map(|m| m.location_type.to_string());
    cells.extend([
        Cell::count("total_injured", metrics.map(|m| m.total_injured)),
        Cell::count("total_killed", metrics.map(|m| m.total_killed)),
        Cell::text("severity", severity.as_deref()),
        Cell::count(
            "number_of_involved_vehicles",
            metrics.map(|m| u32::from(m.involved_vehicle_count)),
        ),
        Cell::text("location_type", location_type.as_deref()),
        Cell::text("holiday_name", record.holiday_name.as_deref()),
        Cell::new(
            "is_public_holiday",
            SqlType::Integer,
            Value::Int(i32::from(record.is_public_holiday)),
        ),
    ]);

    cells
}

fn blank_record() -> MergedRecord {
    MergedRecord {
        crash: CrashRecord::default(),
        holiday_name: None,
        is_public_holiday: false,
    }
}

/// `(name, type)` of every column of the wide output table.
#[must_use]
pub fn table_columns() -> Vec<(Cow<'static, str>, SqlType)> {
    row_cells(&blank_record(), Shape::Wide)
        .into_iter()
        .map(|cell| (cell.name, cell.sql_type))
        .collect()
}

/// `(name, type)` of every column of the fact table.
#[must_use]
pub fn fact_columns() -> Vec<(Cow<'static, str>, SqlType)> {
    let blank = FactRow {
        record: blank_record(),
        contributing_factor_ids: [None; VEHICLE_SLOTS],
        vehicle_type_ids: [None; VEHICLE_SLOTS],
        borough_id: None,
    };
    row_cells(&blank.record, Shape::Fact(&blank))
        .into_iter()
        .map(|cell| (cell.name, cell.sql_type))
        .collect()
}

/// Creates `table` and inserts every row in one transaction.
///
/// Returns the number of rows inserted.
fn create_and_fill(
    duck: &duckdb::Connection,
    table: &str,
    schema: &[(Cow<'static, str>, SqlType)],
    rows: impl Iterator<Item = Vec<Cell>>,
) -> Result<usize, ExportError> {
    let ddl = schema
        .iter()
        .map(|(name, ty)| format!("{name} {}", ty.ddl()))
        .collect::<Vec<_>>()
        .join(",\n    ");
    duck.execute_batch(&format!("CREATE TABLE {table} (\n    {ddl}\n)"))?;

    let names = schema
        .iter()
        .map(|(name, _)| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = schema
        .iter()
        .map(|(_, ty)| ty.placeholder())
        .collect::<Vec<_>>()
        .join(", ");

    duck.execute_batch("BEGIN TRANSACTION")?;
    let mut count = 0usize;
    {
        let mut stmt =
            duck.prepare(&format!("INSERT INTO {table} ({names}) VALUES ({placeholders})"))?;
        for cells in rows {
            stmt.execute(duckdb::params_from_iter(cells.into_iter().map(|c| c.value)))?;
            count += 1;
        }
    }
    duck.execute_batch("COMMIT")?;

    Ok(count)
}

/// Loads merged records into the wide `crashes` table.
///
/// # Errors
///
/// Returns [`ExportError::DuckDb`] if table creation or an insert fails.
pub fn load_crashes(
    duck: &duckdb::Connection,
    records: &[MergedRecord],
) -> Result<usize, ExportError> {
    create_and_fill(
        duck,
        CRASHES_TABLE,
        &table_columns(),
        records.iter().map(|r| row_cells(r, Shape::Wide)),
    )
}

/// Loads the fact table and the three dimension tables.
///
/// # Errors
///
/// Returns [`ExportError::DuckDb`] if table creation or an insert fails.
pub fn load_data_model(
    duck: &duckdb::Connection,
    model: &DataModel,
) -> Result<usize, ExportError> {
    let facts = create_and_fill(
        duck,
        FACT_TABLE,
        &fact_columns(),
        model
            .facts
            .iter()
            .map(|f| row_cells(&f.record, Shape::Fact(f))),
    )?;

    for (dimension, spec) in [
        (&model.contributing_factors, DIM_CONTRIBUTING_FACTORS),
        (&model.vehicle_types, DIM_VEHICLE_TYPES),
        (&model.boroughs, DIM_BOROUGHS),
    ] {
        load_dimension(duck, dimension, spec)?;
    }

    Ok(facts)
}

fn load_dimension(
    duck: &duckdb::Connection,
    dimension: &Dimension,
    (table, id_column, description_column): (&str, &'static str, &'static str),
) -> Result<usize, ExportError> {
    let schema = [
        (Cow::Borrowed(id_column), SqlType::BigInt),
        (Cow::Borrowed(description_column), SqlType::Varchar),
    ];
    let rows = dimension.rows().map(|(id, description)| {
        vec![
            Cell::count(id_column, Some(id)),
            Cell::text(description_column, Some(description)),
        ]
    });
    let count = create_and_fill(duck, table, &schema, rows)?;
    log::debug!("{table}: {count} rows");
    Ok(count)
}

/// Writes a table to a Parquet file, replacing any existing file.
///
/// # Errors
///
/// Returns [`ExportError`] if the parent directory cannot be created or the
/// `COPY` fails.
pub fn copy_to_parquet(
    duck: &duckdb::Connection,
    table: &str,
    path: &Path,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let target = path.display().to_string().replace('\'', "''");
    duck.execute_batch(&format!("COPY {table} TO '{target}' (FORMAT PARQUET)"))?;
    Ok(())
}
