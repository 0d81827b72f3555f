// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans the CSV, printing diagnostics.
// - Option [2] sets the year / station / country filters.
// - Option [3] renders the configured page: metrics, pivots and xlsx exports.
// After generating reports, the user can go back to the menu or exit.
use efficiency_report::config::{AppConfig, CONFIG_FILE};
use efficiency_report::filter::{ALL_COUNTRIES, ALL_STATIONS};
use efficiency_report::types::Record;
use efficiency_report::{loader, output, render, util, FilterOptions, FilterSpec};
use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

// One dataset per session; recomputed views never outlive a render call.
struct Session {
    data: Vec<Record>,
    options: FilterOptions,
    filters: FilterSpec,
}

/// `None` once stdin is closed.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    util::read_trimmed_line(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N` or closed
/// the input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(cfg: &AppConfig) -> Option<Session> {
    match loader::load_and_clean(&cfg.data_path) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                util::format_int(report.total_rows),
                util::format_int(report.loaded_rows)
            );
            println!(
                "Note: {} rows skipped due to parse errors, {} without a numeric year.",
                util::format_int(report.parse_errors),
                util::format_int(report.missing_year)
            );
            let options = FilterOptions::from_records(&data);
            if let Some((lo, hi)) = options.year_bounds {
                println!("Years available: {}-{}", lo, hi);
            }
            println!();
            let filters = options.default_spec();
            Some(Session { data, options, filters })
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            None
        }
    }
}

fn parse_years(input: &str, bounds: (i32, i32)) -> Option<(i32, i32)> {
    if input.is_empty() {
        return Some(bounds);
    }
    let (lo, hi) = input.split_once('-')?;
    Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?))
}

fn handle_filters(session: &mut Session) {
    let bounds = session.options.year_bounds.unwrap_or((0, 0));
    let Some(years) = prompt(&format!("Year range [{}-{}]: ", bounds.0, bounds.1)) else {
        return;
    };
    let Some(years) = parse_years(&years, bounds) else {
        println!("Invalid year range. Use the form 2019-2022.\n");
        return;
    };

    println!("Stations: {}", session.options.stations.join(", "));
    let Some(station) = prompt(&format!("Station [{}]: ", ALL_STATIONS)) else {
        return;
    };
    let station = if station.is_empty() { ALL_STATIONS.to_string() } else { station };

    println!("Countries: {}", session.options.countries.join(", "));
    let Some(countries) = prompt(&format!("Countries, comma separated [{}]: ", ALL_COUNTRIES))
    else {
        return;
    };
    let countries: Vec<String> = if countries.is_empty() {
        vec![ALL_COUNTRIES.to_string()]
    } else {
        countries
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    };

    match FilterSpec::from_selection(years, &station, countries.as_slice()) {
        Ok(spec) => {
            session.filters = spec;
            println!("Filters updated.\n");
        }
        Err(e) => println!("{}\n", e),
    }
}

fn handle_generate_reports(cfg: &AppConfig, session: &Session) -> Result<(), Box<dyn Error>> {
    let dashboard = render(&session.data, &session.filters, cfg.page)?;

    println!("Generating reports...\n");
    let summary = &dashboard.summary;
    println!("Tiempo Promedio en Meses: {}", util::format_opt(summary.avg_kpi, 2));
    println!("Proyectos: {}", util::format_int(summary.total_projects));
    println!("Total de Estaciones: {}\n", util::format_int(summary.total_stations));

    println!("Tiempo de Respuesta Promedio en Meses por País\n");
    output::preview_table_rows(&dashboard.country_means, usize::MAX);
    println!("Eficiencia en Tiempos de Respuesta\n");
    output::preview_table_rows(&dashboard.productivity, usize::MAX);

    for p in &dashboard.pivots {
        output::preview_pivot(p.request.title, &p.table);
    }

    let written = output::write_exports(&cfg.output_dir, &dashboard.exports)?;
    for path in &written {
        println!("(Table exported to {})", path.display());
    }
    let summary_path = cfg.output_dir.join("summary.json");
    output::write_summary(&summary_path, &dashboard)?;
    println!("Summary saved to {}\n", summary_path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cfg = AppConfig::load(Path::new(CONFIG_FILE))?;
    env_logger::Builder::new()
        .filter_level(cfg.level_filter())
        .parse_default_env()
        .init();

    let mut session: Option<Session> = None;
    loop {
        println!("Operational Efficiency Report:");
        println!("[1] Load the file");
        println!("[2] Set filters");
        println!("[3] Generate Reports\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Some(s) = handle_load(&cfg) {
                    session = Some(s);
                }
            }
            "2" => match session.as_mut() {
                Some(s) => handle_filters(s),
                None => {
                    println!("Error: No data loaded. Please load the CSV file first (option 1).\n")
                }
            },
            "3" => {
                let Some(s) = session.as_ref() else {
                    println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
                    continue;
                };
                println!();
                if let Err(e) = handle_generate_reports(&cfg, s) {
                    eprintln!("Report error: {}", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
    Ok(())
}
