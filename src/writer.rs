use crate::host::Actor;
use anyhow::Result;
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ActorRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "pp")]
    pp: Decimal,
    #[serde(rename = "gp")]
    gp: Decimal,
    #[serde(rename = "ep")]
    ep: Decimal,
    #[serde(rename = "sp")]
    sp: Decimal,
    #[serde(rename = "cp")]
    cp: Decimal,
    #[serde(rename = "Items")]
    items: String,
}

impl ActorRow {
    pub(crate) fn new(actor: &Actor) -> ActorRow {
        let currency = actor.currency.clone().normalize();
        let items: Vec<String> = actor.items.iter().map(|i| i.to_ref().to_string()).collect();
        ActorRow {
            id: actor.id.clone(),
            name: actor.name.clone(),
            pp: currency.pp,
            gp: currency.gp,
            ep: currency.ep,
            sp: currency.sp,
            cp: currency.cp,
            items: items.join(", "),
        }
    }
}

/// Wraps the `stdout.lock()` in a `csv::Writer` and writes the rows.
/// The `csv::Writer` is already buffered so there is no need to wrap
/// `stdout.lock()` in a `io::BufWriter`.
pub(crate) async fn print<S: Serialize>(rows: &[S]) -> Result<()> {
    let stdout = io::stdout();
    write(stdout.lock(), rows)
}

pub(crate) fn write<W: Write, S: Serialize>(handle: W, rows: &[S]) -> Result<()> {
    let mut wtr =
        WriterBuilder::new()
            .has_headers(true)
            .delimiter(b';')
            .from_writer(handle);

    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
