//! Join two introspected tables and print the result.
//!
//! Run with:
//!   cargo run --example episodes -p relq
//!
//! Set `RUST_LOG=relq=debug` to see every statement the layer issues.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use relq::{
    Database, InstrumentedDriver, LoggingMonitor, MonitorConfig, OrmResult, Record, Selectable,
    SqliteDriver, TracingSqlHook, params,
};
use tracing_subscriber::EnvFilter;

const SCHEMA: &str = "
    CREATE TABLE productions (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE episodes (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        production_id INTEGER REFERENCES productions(id)
    );
";

fn print_records(title: &str, records: &[Record]) {
    println!("\n{title}");
    let Some(first) = records.first() else {
        println!("  (no rows)");
        return;
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(first.fields().iter().map(|f| {
            Cell::new(f)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        }));
    for record in records {
        table.add_row(record.values().iter().map(|v| Cell::new(v.to_string())));
    }
    println!("{table}");
}

fn main() -> OrmResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sqlite = SqliteDriver::open_in_memory()?;
    sqlite.execute_batch(SCHEMA)?;

    let driver = InstrumentedDriver::new(sqlite)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor(LoggingMonitor::new())
        .add_hook(TracingSqlHook::new());
    let db = Database::new(driver);
    println!("tables: {:?}", db.table_names()?);

    let productions = db.get_table("productions")?;
    let episodes = db.get_table("episodes")?;

    productions.insert(&params! { "id" => 1, "name" => "Northern Lights" })?;
    productions.insert(&params! { "id" => 2, "name" => "Harbour Town" })?;
    for (name, production_id) in [
        ("Pilot", 1),
        ("The Long Night", 1),
        ("Thaw", 1),
        ("Arrivals", 2),
        ("Low Tide", 2),
    ] {
        episodes.insert(&params! { "name" => name, "production_id" => production_id })?;
    }

    let join = db.create_join(
        [episodes
            .column("production_id")?
            .equals(productions.column("id")?)],
        [
            episodes.column("name")?.alias("episode_name"),
            productions.column("name")?.alias("production_name"),
        ],
    )?;
    println!("\n{}", join.select_sql(None, None));
    print_records("All episodes", &join.select(None, None)?.all()?);

    let harbour = join.select(Some("productions.id = 2"), None)?.all()?;
    print_records("Harbour Town only", &harbour);

    let pilot = episodes.select_one_where(&params! { "name" => "Pilot" })?;
    print_records("select_one_where(name = 'Pilot')", &[pilot]);

    Ok(())
}
