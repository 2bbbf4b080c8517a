//! Collections command - list target collections

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let collections = ctx.collections_service.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collections)?);
        return Ok(());
    }

    if collections.is_empty() {
        output::info("No collections besides the bookings ledger.");
        return Ok(());
    }

    println!("{}", "Collections".bold());
    let mut table = output::create_table();
    table.set_header(vec!["Name", "Listing", "Commission"]);
    for collection in collections {
        let rate = collection
            .commission_rate
            .map(output::format_percent)
            .unwrap_or_default();
        table.add_row(vec![collection.name, collection.listing_name, rate]);
    }
    println!("{}", table);

    Ok(())
}
