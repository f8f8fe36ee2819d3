//! `pulse` terminal driver
//!
//! Opens a session against the bundled mock feed and prints the result:
//! - `stream`: ingest a store summary, optionally applying the top action
//! - `what-if`: project scenario KPIs from the loaded baseline
//! - `command`: route one operator instruction

mod logging;
mod render;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as Cli};
use pulse_agent::{CommandHandler, FeedController, FeedIngestor, IngestEnd, LogSpeech, MockFeed};
use pulse_core::{Command, CopilotStore, Ignored, Outcome, PulseConfig};
use pulse_scenario::{ConstraintsPatch, ScenarioPatch, ScenarioPreset, UpliftPreset};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn cli() -> Cli {
    Cli::new("pulse")
        .version(pulse_agent::VERSION)
        .about("Store copilot: live summaries, recommendations and what-if projections")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .help("Store to open, defaults to the configured store"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand_required(true)
        .subcommand(
            Cli::new("stream")
                .about("Ingest the store feed and print the session")
                .arg(
                    Arg::new("apply-first")
                        .long("apply-first")
                        .action(ArgAction::SetTrue)
                        .help("Apply the most urgent actionable recommendation"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Cli::new("what-if")
                .about("Project KPIs for a scenario")
                .arg(
                    Arg::new("preset")
                        .long("preset")
                        .value_parser(value_parser!(ScenarioPreset))
                        .help("mezzanine, budget or replenishment"),
                )
                .arg(
                    Arg::new("mezzanine-sqft")
                        .long("mezzanine-sqft")
                        .value_parser(value_parser!(f64))
                        .help("Added mezzanine floor area"),
                )
                .arg(
                    Arg::new("add-budget")
                        .long("add-budget")
                        .value_parser(value_parser!(f64))
                        .help("Added capital budget"),
                )
                .arg(
                    Arg::new("receiving")
                        .long("receiving")
                        .value_parser(value_parser!(u8))
                        .help("Receiving deliveries per week, 1-5"),
                )
                .arg(
                    Arg::new("bays")
                        .long("bays")
                        .value_parser(value_parser!(u32))
                        .help("Extra bays"),
                )
                .arg(
                    Arg::new("staffing")
                        .long("staffing")
                        .value_parser(value_parser!(bool))
                        .help("Whether staffing can absorb the change"),
                )
                .arg(
                    Arg::new("uplift")
                        .long("uplift")
                        .value_parser(value_parser!(UpliftPreset))
                        .help("conservative, base or aggressive"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Cli::new("command")
                .about("Send one instruction to the copilot")
                .arg(
                    Arg::new("text")
                        .required(true)
                        .num_args(1..)
                        .help("Instruction text"),
                )
                .arg(json_flag()),
        )
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<PulseConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => PulseConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PulseConfig::default()),
    }
}

/// Patch assembled from the what-if knob flags
fn scenario_patch(args: &ArgMatches) -> ScenarioPatch {
    let constraints = ConstraintsPatch {
        staffing_ok: args.get_one::<bool>("staffing").copied(),
        receiving_xpw: args.get_one::<u8>("receiving").copied(),
        bays: args.get_one::<u32>("bays").copied(),
    };
    ScenarioPatch {
        mezzanine_sqft: args.get_one::<f64>("mezzanine-sqft").copied(),
        add_budget: args.get_one::<f64>("add-budget").copied(),
        constraints: (constraints != ConstraintsPatch::default()).then_some(constraints),
        uplift_preset: args.get_one::<UpliftPreset>("uplift").copied(),
    }
}

/// Run the feed for `store_id` to completion against the bundled mock data
async fn open_session(
    store: &Arc<CopilotStore>,
    feed: Arc<MockFeed>,
    store_id: &str,
    speak: bool,
) -> anyhow::Result<()> {
    let mut ingestor = FeedIngestor::new(store.clone(), feed);
    if speak {
        ingestor = ingestor.with_speech(Arc::new(LogSpeech));
    }
    let controller = FeedController::new(ingestor);
    controller.switch_store(store_id);

    let Some(report) = controller.wait().await else {
        bail!("feed for {store_id} was cancelled");
    };
    info!(
        store_id,
        end = ?report.end,
        applied = report.applied,
        dropped = report.dropped,
        "feed finished"
    );
    if report.end == IngestEnd::Failed {
        let status = store.read(|s| s.status());
        bail!("could not load store {store_id} (status {status})");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"), matches.get_flag("verbose"));

    let config = load_config(&matches)?;
    let store_id = matches
        .get_one::<String>("store")
        .cloned()
        .unwrap_or_else(|| config.feed.store_id.clone());
    let feed = Arc::new(
        MockFeed::bundled()
            .context("loading bundled store data")?
            .with_event_delay(Duration::from_millis(config.feed.event_delay_ms)),
    );
    let store = CopilotStore::shared(config);

    match matches.subcommand() {
        Some(("stream", args)) => {
            open_session(&store, feed, &store_id, true).await?;
            if args.get_flag("apply-first") {
                let first = store.read(|s| s.catalog().first_actionable().map(|a| a.id.clone()));
                match first {
                    Some(action_id) => match store.dispatch(Command::Apply { action_id }) {
                        Outcome::Ignored(reason) => warn!(?reason, "apply skipped"),
                        _ => info!("applied top recommendation"),
                    },
                    None => warn!("no actionable recommendation to apply"),
                }
            }
            println!("{}", store.read(|s| render::session(s, args.get_flag("json")))?);
        }
        Some(("what-if", args)) => {
            open_session(&store, feed, &store_id, false).await?;
            match args.get_one::<ScenarioPreset>("preset") {
                Some(preset) => store.dispatch(Command::ApplyPreset(*preset)),
                None => store.dispatch(Command::ActivateWhatIf),
            };
            let patch = scenario_patch(args);
            if !patch.is_empty() {
                if let Outcome::Ignored(Ignored::InvalidScenario(err)) =
                    store.dispatch(Command::UpdateWhatIf(patch))
                {
                    return Err(err).context("invalid scenario");
                }
            }
            println!("{}", store.read(|s| render::what_if(s, args.get_flag("json")))?);
        }
        Some(("command", args)) => {
            let text = args
                .get_many::<String>("text")
                .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            open_session(&store, feed.clone(), &store_id, false).await?;
            let handler = CommandHandler::new(store.clone()).with_provider(feed);
            let handled = handler.handle_instruction(&text).await;
            info!(?handled, "instruction handled");
            println!("{}", store.read(|s| render::session(s, args.get_flag("json")))?);
        }
        _ => bail!("a subcommand is required"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn store_flag_is_global() {
        let matches = cli()
            .try_get_matches_from(["pulse", "stream", "--store", "SEA_014", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("store").map(String::as_str),
            Some("SEA_014")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "stream");
        assert!(args.get_flag("json"));
        assert!(!args.get_flag("apply-first"));
    }

    #[test]
    fn what_if_flags_build_a_patch() {
        let matches = cli()
            .try_get_matches_from([
                "pulse",
                "what-if",
                "--mezzanine-sqft",
                "500",
                "--bays",
                "4",
                "--uplift",
                "aggressive",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(
            scenario_patch(args),
            ScenarioPatch {
                mezzanine_sqft: Some(500.0),
                add_budget: None,
                constraints: Some(ConstraintsPatch {
                    staffing_ok: None,
                    receiving_xpw: None,
                    bays: Some(4),
                }),
                uplift_preset: Some(UpliftPreset::Aggressive),
            }
        );
    }

    #[test]
    fn empty_knobs_build_an_empty_patch() {
        let matches = cli().try_get_matches_from(["pulse", "what-if"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert!(scenario_patch(args).is_empty());
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["pulse", "what-if", "--preset", "warehouse"])
            .is_err());
    }

    #[test]
    fn command_joins_words() {
        let matches = cli()
            .try_get_matches_from(["pulse", "command", "dismiss", "the", "top", "one"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let words: Vec<_> = args.get_many::<String>("text").unwrap().cloned().collect();
        assert_eq!(words.join(" "), "dismiss the top one");
    }
}
