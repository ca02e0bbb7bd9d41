use crate::cli::ElementsArgs;
use crate::error::{CliError, Result};
use latticelab::core::models::element::{ElementProperties, ElementTable};
use std::fmt::Write;

pub fn run(args: ElementsArgs) -> Result<()> {
    let table = match &args.elements {
        Some(path) => ElementTable::load(path)?,
        None => ElementTable::builtin(),
    };

    match &args.symbol {
        Some(symbol) => {
            let props = table
                .get(symbol)
                .ok_or_else(|| CliError::Argument(format!("Unknown element symbol '{}'", symbol)))?;
            print!("{}", describe(symbol, props));
        }
        None => print!("{}", listing(&table)),
    }
    Ok(())
}

pub fn listing(table: &ElementTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<3} {:<14} {:>8} {:>5} {:>7} {:>6}",
        "Z", "Sym", "Name", "Mass", "EN", "Valence", "Metal"
    );
    for symbol in table.symbols() {
        let Some(p) = table.get(symbol) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<3} {:<14} {:>8.3} {:>5.2} {:>7} {:>6}",
            p.number,
            symbol,
            p.name,
            p.mass,
            p.electronegativity,
            p.valence,
            if p.is_metal() { "yes" } else { "no" }
        );
    }
    out
}

pub fn describe(symbol: &str, p: &ElementProperties) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}), Z = {}", p.name, symbol, p.number);
    let _ = writeln!(out, "  category:          {}", p.category);
    let _ = writeln!(out, "  mass:              {:.4}", p.mass);
    let _ = writeln!(out, "  electronegativity: {:.2}", p.electronegativity);
    let _ = writeln!(out, "  valence:           {}", p.valence);
    let _ = writeln!(out, "  shells:            {:?}", p.shells);
    let _ = writeln!(out, "  covalent radius:   {:.1} pm", p.covalent_radius_pm());
    let _ = writeln!(out, "  vdW radius:        {:.1} pm", p.vanderwaals_radius_pm());
    let _ = writeln!(out, "  polarizability:    {:.3} A^3", p.polarizability());
    let _ = writeln!(out, "  metal:             {}", p.is_metal());
    if let Some(geometry) = p.geometry() {
        let _ = writeln!(out, "  geometry:          {}", geometry);
    }
    if let Some(angle) = p.ideal_bond_angle {
        let _ = writeln!(out, "  ideal angle:       {:.1} deg", angle);
    }
    out
}
