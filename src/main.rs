use clap::Parser;
use saphire::app::{report, scenarios};
use saphire::config::{Command, RunArgs, ScenarioChoice};
use saphire::core::Scenario;
use saphire::utils::error::SaphireError;
use saphire::utils::{logger, validation::Validate};
use saphire::{build_panel, CliConfig, ConversationEngine, CouncilConfig, Panel, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting saphire");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = execute(&cli).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        std::process::exit(e.severity().exit_code());
    }

    Ok(())
}

async fn execute(cli: &CliConfig) -> Result<(), SaphireError> {
    let config = cli.load_config()?;
    config.validate()?;
    tracing::debug!("Configuration validated");

    match &cli.command {
        Command::Run(args) => run_scenarios(&config, args).await,
        Command::View { limit } => {
            let store = SqliteStore::open(config.database_path())?;
            let rendered = report::view_latest(&store, *limit)?;
            if rendered.is_empty() {
                println!("No dialogues stored in {}", config.database_path());
            } else {
                print!("{}", rendered);
            }
            Ok(())
        }
        Command::InitDb => {
            SqliteStore::open(config.database_path())?;
            println!("✅ Dialogue table ready in {}", config.database_path());
            Ok(())
        }
        Command::CheckConfig => {
            display_config_summary(&config);
            println!("✅ Configuration is valid");
            Ok(())
        }
    }
}

fn selected_scenarios(config: &CouncilConfig, choice: ScenarioChoice) -> Vec<Box<dyn Scenario>> {
    match choice {
        ScenarioChoice::RussianDialogue => vec![scenarios::russian_dialogue(config)],
        ScenarioChoice::TaskSolving => vec![scenarios::task_solving(config)],
        ScenarioChoice::All => vec![
            scenarios::russian_dialogue(config),
            scenarios::task_solving(config),
        ],
    }
}

async fn run_scenarios(config: &CouncilConfig, args: &RunArgs) -> Result<(), SaphireError> {
    let selected = selected_scenarios(config, args.scenario);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no model will be called");
        display_config_summary(config);
        let panel = config.panel();
        for scenario in &selected {
            println!(
                "  {} → {} model call(s)",
                scenario.name(),
                scenario.planned_calls(&panel)
            );
        }
        return Ok(());
    }

    let panel = Panel::new(build_panel(config)?).with_echo(!args.quiet);
    let store = SqliteStore::open(config.database_path())?;
    let engine = ConversationEngine::new_with_monitoring(store, panel, config.monitoring_enabled());

    for scenario in &selected {
        let report = engine.run(scenario.as_ref()).await?;
        tracing::info!(
            "✅ {} completed in {:?} ({} entries)",
            report.test_name,
            report.duration,
            report.entries
        );
        println!("✅ {} saved to {}", report.test_name, config.database_path());
    }

    Ok(())
}

fn display_config_summary(config: &CouncilConfig) {
    println!("📋 Configuration Summary:");
    println!(
        "  Panel: {}",
        config
            .panel()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  OpenAI: {} @ {}", config.openai.model(), config.openai.base_url());
    println!("  Ollama: {} @ {}", config.ollama.model(), config.ollama.base_url());
    println!(
        "  GigaChat: {} @ {} (verify TLS: {})",
        config.gigachat.model(),
        config.gigachat.base_url(),
        config.gigachat.verify_ssl_certs()
    );
    println!("  Database: {}", config.database_path());
    println!("  Rounds: {}", config.rounds());
    println!("  Final reply minimum: {} words", config.final_min_words());
    println!();
}
