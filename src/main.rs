use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, ExportArgs, SearchArgs, UpdateArgs};
use weather_journal::presentation::{self, RenderState};
use weather_journal::{
    ExportFormat, JournalClient, JournalConfig, QueryUpdate, WeatherRecord, analyzer, logging,
    weather, web,
};

mod cli;

fn client(config: &JournalConfig) -> Result<JournalClient> {
    Ok(JournalClient::new(&config.client)?)
}

fn print_view(state: &mut RenderState, record: &WeatherRecord) {
    let view = presentation::render(state, record, &mut rand::rng());
    println!("#{} {}", record.id, view);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = JournalConfig::load_from_path(args.config.clone())
        .context("Failed to load configuration")?;
    if let Some(api_base) = args.api_base {
        config.client.api_base = api_base;
    }
    logging::init(&config.logging, args.verbose);

    match args.cmd {
        Command::Serve => web::run(&config).await,
        Command::Analyze { text } => {
            let analysis = analyzer::analyze(&text);
            let show = |v: Option<i64>| v.map_or_else(|| "n/a".to_string(), |v| v.to_string());
            println!("Min: {}", show(analysis.temperatures.min));
            println!("Max: {}", show(analysis.temperatures.max));
            println!("Theme: {}", analysis.theme);
            println!("Tips:");
            for tip in &analysis.tips {
                println!("- {tip}");
            }
            Ok(())
        }
        Command::Locate { lat, lon } => {
            println!("{}", weather::reverse_geocode(&config.weather, lat, lon).await);
            Ok(())
        }
        Command::Search(SearchArgs {
            location,
            start,
            end,
        }) => {
            let record = client(&config)?.create_query(&location, start, end).await?;
            print_view(&mut RenderState::new(), &record);
            Ok(())
        }
        Command::List => {
            let records = client(&config)?.list_queries().await?;
            if records.is_empty() {
                println!("No saved queries yet.");
            }
            for record in &records {
                println!("{record}");
            }
            Ok(())
        }
        Command::Show { id } => {
            let record = client(&config)?.get_query(id).await?;
            print_view(&mut RenderState::new(), &record);
            Ok(())
        }
        Command::Update(UpdateArgs {
            id,
            location,
            start,
            end,
        }) => {
            let update = QueryUpdate {
                location,
                start_date: start,
                end_date: end,
            };
            let record = client(&config)?.update_query(id, &update).await?;
            print_view(&mut RenderState::new(), &record);
            Ok(())
        }
        Command::Delete { id } => {
            let deleted = client(&config)?.delete_query(id).await?;
            println!("Deleted #{deleted}");
            Ok(())
        }
        Command::Export(ExportArgs { format, output }) => {
            let body = client(&config)?
                .export(ExportFormat::parse_lenient(&format))
                .await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{body}"),
            }
            Ok(())
        }
    }
}
